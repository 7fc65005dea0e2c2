use crate::adapters::http::HttpFetcher;
use crate::config::toml_config::{PathsConfig, RefreshConfig};
use crate::core::backup::backup_processed_dir;
use crate::core::calendar::ReportingCalendar;
use crate::core::download::SourceDownloader;
use crate::core::store::VersionedStore;
use crate::domain::model::{BackupReport, DownloadReport, SourceTable};
use crate::domain::ports::Fetcher;
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Runs refresh operations against one data directory, dating them with
/// the reporting calendar.
pub struct RefreshEngine<F: Fetcher> {
    downloader: SourceDownloader<F>,
    calendar: ReportingCalendar,
    paths: PathsConfig,
}

impl RefreshEngine<HttpFetcher> {
    pub fn from_config(config: &RefreshConfig) -> Result<Self> {
        Ok(Self::new(
            HttpFetcher::new(&config.fetch)?,
            config.calendar.to_calendar()?,
            config.paths.clone(),
        ))
    }
}

impl<F: Fetcher> RefreshEngine<F> {
    pub fn new(fetcher: F, calendar: ReportingCalendar, paths: PathsConfig) -> Self {
        Self {
            downloader: SourceDownloader::new(fetcher),
            calendar,
            paths,
        }
    }

    pub fn calendar(&self) -> &ReportingCalendar {
        &self.calendar
    }

    pub fn sources_store(&self) -> VersionedStore {
        VersionedStore::new(self.paths.sources_dir())
    }

    pub fn backups_store(&self) -> VersionedStore {
        VersionedStore::new(self.paths.processed_backups_dir())
    }

    /// Download `tables` into `sources/<report date>[_v#]/`.
    pub async fn download(&self, tables: &[SourceTable], versioned: bool) -> Result<DownloadReport> {
        let date = self.calendar.report_date();
        tracing::info!("Report date is {} ({})", date, self.calendar.timezone());
        self.download_for_date(tables, date, versioned).await
    }

    pub async fn download_for_date(
        &self,
        tables: &[SourceTable],
        date: NaiveDate,
        versioned: bool,
    ) -> Result<DownloadReport> {
        let report = self
            .downloader
            .download_tables(tables, &self.sources_store(), date, versioned)
            .await?;
        tracing::info!(
            "Downloaded {} file(s) into {}",
            report.files.len(),
            report.directory.display()
        );
        Ok(report)
    }

    /// Directory a download would use now, without touching the filesystem.
    pub fn planned_sources_dir(&self, versioned: bool) -> PathBuf {
        self.sources_store()
            .peek_dir(self.calendar.report_date(), versioned)
    }

    /// Back up `processed/` under today's date. Processed output is dated
    /// by when it was produced, so no reporting lag applies.
    pub fn backup_processed(&self) -> Result<BackupReport> {
        self.backup_processed_for_date(self.calendar.today())
    }

    pub fn backup_processed_for_date(&self, date: NaiveDate) -> Result<BackupReport> {
        backup_processed_dir(&self.paths.processed_dir(), &self.backups_store(), date)
    }

    pub fn latest_sources_dir(&self, date: Option<NaiveDate>) -> Result<String> {
        let store = self.sources_store();
        match date {
            Some(date) => store.latest_directory_for_date(date),
            None => store.latest_directory(),
        }
    }
}
