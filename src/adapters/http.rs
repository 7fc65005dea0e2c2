use crate::config::toml_config::FetchSettings;
use crate::domain::model::FetchResult;
use crate::domain::ports::Fetcher;
use crate::utils::error::{RefreshError, Result};
use crate::utils::text::decode_text;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fetches over HTTP. Upstream servers are unreliable, so a failed attempt
/// (non-success status or transport error) is retried up to
/// `max_attempts` times. Decoding happens once, on the first good body.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        Ok(Self::with_client(
            builder.build()?,
            settings.max_attempts,
            Duration::from_millis(settings.retry_delay_ms),
        ))
    }

    pub fn with_client(client: Client, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    async fn get_with_retries(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_status = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }

            tracing::debug!("GET {} (attempt {}/{})", url, attempt, self.max_attempts);
            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_status = None;
                    tracing::warn!("Request to {} failed on attempt {}: {}", url, attempt, e);
                    continue;
                }
            };

            let status = response.status();
            tracing::debug!("Response status from {}: {}", url, status);
            if !status.is_success() {
                last_status = Some(status.as_u16());
                tracing::warn!("{} returned {} on attempt {}", url, status, attempt);
                continue;
            }

            match response.bytes().await {
                Ok(bytes) => return Ok(bytes.to_vec()),
                Err(e) => {
                    last_status = None;
                    tracing::warn!("Reading body from {} failed on attempt {}: {}", url, attempt, e);
                }
            }
        }

        Err(RefreshError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.max_attempts,
            last_status,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let bytes = self.get_with_retries(url).await?;

        let (text, encoding) = decode_text(&bytes).ok_or_else(|| RefreshError::DecodeError {
            url: url.to_string(),
        })?;
        tracing::debug!("Decoded {} bytes from {} as {}", bytes.len(), url, encoding);

        Ok(FetchResult {
            bytes,
            text,
            encoding,
        })
    }
}
