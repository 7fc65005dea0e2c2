use crate::core::store::{write_file, VersionedStore};
use crate::domain::model::{DownloadReport, SourceEntry, SourceTable};
use crate::domain::ports::Fetcher;
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub struct SourceDownloader<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> SourceDownloader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Download one table into a freshly resolved directory for `date`.
    pub async fn download(
        &self,
        table: &SourceTable,
        store: &VersionedStore,
        date: NaiveDate,
        versioned: bool,
    ) -> Result<DownloadReport> {
        self.download_tables(std::slice::from_ref(table), store, date, versioned)
            .await
    }

    /// Download several tables, in order, into one directory resolved once
    /// up front. Stops at the first failure; files already written stay.
    pub async fn download_tables(
        &self,
        tables: &[SourceTable],
        store: &VersionedStore,
        date: NaiveDate,
        versioned: bool,
    ) -> Result<DownloadReport> {
        let directory = store.resolve_dir(date, versioned)?;
        tracing::info!("Downloading sources into {}", directory.display());

        let mut files = Vec::new();
        for table in tables {
            tracing::info!("Fetching {} file(s) from '{}'", table.len(), table.name);
            for entry in &table.entries {
                let path = self.download_entry(entry, &directory).await?;
                files.push(path);
            }
        }

        Ok(DownloadReport { directory, files })
    }

    async fn download_entry(&self, entry: &SourceEntry, directory: &Path) -> Result<PathBuf> {
        let fetched = self.fetcher.fetch(&entry.url).await?;
        let path = directory.join(&entry.filename);
        write_file(&path, &fetched.text)?;
        tracing::info!(
            "Saved {} ({} bytes, {})",
            path.display(),
            fetched.bytes.len(),
            fetched.encoding
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FetchResult;
    use crate::utils::error::RefreshError;
    use crate::utils::text::TextEncoding;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves canned bodies and records which URLs were requested.
    struct MockFetcher {
        bodies: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn new(bodies: &[(&str, &str)]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchResult> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.bodies.get(url) {
                Some(body) => Ok(FetchResult {
                    bytes: body.as_bytes().to_vec(),
                    text: body.clone(),
                    encoding: TextEncoding::Utf8,
                }),
                None => Err(RefreshError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: 3,
                    last_status: Some(404),
                }),
            }
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_download_writes_each_entry_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionedStore::new(temp_dir.path());
        let table = SourceTable::new("test")
            .with_entry("a.csv", "mock://a")
            .with_entry("b.csv", "mock://b");
        let downloader =
            SourceDownloader::new(MockFetcher::new(&[("mock://a", "alpha"), ("mock://b", "beta")]));

        let report = downloader.download(&table, &store, date(), true).await.unwrap();

        assert_eq!(report.directory, temp_dir.path().join("2021-03-01"));
        assert_eq!(
            report.files,
            vec![report.directory.join("a.csv"), report.directory.join("b.csv")]
        );
        assert_eq!(fs::read_to_string(&report.files[0]).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(&report.files[1]).unwrap(), "beta");
        assert_eq!(downloader.fetcher().requested(), vec!["mock://a", "mock://b"]);
    }

    #[tokio::test]
    async fn test_download_stops_at_first_fetch_failure() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionedStore::new(temp_dir.path());
        let table = SourceTable::new("test")
            .with_entry("a.csv", "mock://a")
            .with_entry("missing.csv", "mock://missing")
            .with_entry("c.csv", "mock://c");
        let downloader =
            SourceDownloader::new(MockFetcher::new(&[("mock://a", "alpha"), ("mock://c", "gamma")]));

        let result = downloader.download(&table, &store, date(), true).await;

        assert!(matches!(result, Err(RefreshError::RetriesExhausted { .. })));
        assert_eq!(downloader.fetcher().requested(), vec!["mock://a", "mock://missing"]);

        // The partial batch is left in place.
        let directory = temp_dir.path().join("2021-03-01");
        assert!(directory.join("a.csv").exists());
        assert!(!directory.join("c.csv").exists());
    }

    #[tokio::test]
    async fn test_unversioned_rerun_fails_on_collision() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionedStore::new(temp_dir.path());
        let table = SourceTable::new("test")
            .with_entry("a.csv", "mock://a")
            .with_entry("b.csv", "mock://b");

        let first = SourceDownloader::new(MockFetcher::new(&[("mock://a", "v1"), ("mock://b", "v1")]));
        first.download(&table, &store, date(), false).await.unwrap();

        let second = SourceDownloader::new(MockFetcher::new(&[("mock://a", "v2"), ("mock://b", "v2")]));
        let result = second.download(&table, &store, date(), false).await;

        assert!(matches!(result, Err(RefreshError::FileExists { .. })));
        // Aborted on the first collision.
        assert_eq!(second.fetcher().requested(), vec!["mock://a"]);
        let directory = temp_dir.path().join("2021-03-01");
        assert_eq!(fs::read_to_string(directory.join("a.csv")).unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_versioned_rerun_uses_new_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionedStore::new(temp_dir.path());
        let table = SourceTable::new("test").with_entry("a.csv", "mock://a");
        let downloader = SourceDownloader::new(MockFetcher::new(&[("mock://a", "alpha")]));

        let first = downloader.download(&table, &store, date(), true).await.unwrap();
        let second = downloader.download(&table, &store, date(), true).await.unwrap();

        assert_eq!(first.directory, temp_dir.path().join("2021-03-01"));
        assert_eq!(second.directory, temp_dir.path().join("2021-03-01_v2"));
        assert_eq!(store.latest_directory().unwrap(), "2021-03-01_v2");
    }

    #[tokio::test]
    async fn test_download_tables_share_one_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionedStore::new(temp_dir.path());
        let tables = vec![
            SourceTable::new("mtl").with_entry("data_mtl_age.csv", "mock://age"),
            SourceTable::new("inspq").with_entry("data_qc.csv", "mock://qc"),
        ];
        let downloader =
            SourceDownloader::new(MockFetcher::new(&[("mock://age", "age"), ("mock://qc", "qc")]));

        let report = downloader
            .download_tables(&tables, &store, date(), true)
            .await
            .unwrap();

        assert_eq!(report.files.len(), 2);
        assert!(report.files.iter().all(|f| f.parent() == Some(report.directory.as_path())));
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
