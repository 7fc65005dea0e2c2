pub mod backup;
pub mod calendar;
pub mod download;
pub mod engine;
pub mod store;

pub use crate::domain::model::{BackupReport, DownloadReport, FetchResult, SourceEntry, SourceTable};
pub use crate::domain::ports::Fetcher;
pub use crate::utils::error::Result;
