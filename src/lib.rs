pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::HttpFetcher;
pub use config::RefreshConfig;
pub use core::{calendar::ReportingCalendar, engine::RefreshEngine, store::VersionedStore};
pub use domain::sources::SourceGroup;
pub use utils::error::{RefreshError, Result};
