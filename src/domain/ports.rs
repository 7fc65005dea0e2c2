use crate::domain::model::FetchResult;
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve and decode the document at `url`.
    async fn fetch(&self, url: &str) -> Result<FetchResult>;
}
