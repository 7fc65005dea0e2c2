use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to retrieve {url} after {attempts} attempt(s){}", status_suffix(.last_status))]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error("Response from {url} is neither valid UTF-8 nor Windows-1252")]
    DecodeError { url: String },

    #[error("{} already exists", .path.display())]
    FileExists { path: PathBuf },

    #[error("No versioned directory found in {}{}", .dir.display(), date_suffix(.date))]
    NoVersionedDirectory { dir: PathBuf, date: Option<String> },

    #[error("Unknown source group: {name}")]
    UnknownSourceGroup { name: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (last status: {})", code),
        None => " (no response received)".to_string(),
    }
}

fn date_suffix(date: &Option<String>) -> String {
    match date {
        Some(date) => format!(" for {}", date),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Encoding,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code the CLI uses for an error of this severity.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl RefreshError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RefreshError::HttpError(_) | RefreshError::RetriesExhausted { .. } => {
                ErrorCategory::Network
            }
            RefreshError::DecodeError { .. } => ErrorCategory::Encoding,
            RefreshError::IoError(_)
            | RefreshError::FileExists { .. }
            | RefreshError::NoVersionedDirectory { .. } => ErrorCategory::Storage,
            RefreshError::UnknownSourceGroup { .. }
            | RefreshError::ConfigError { .. }
            | RefreshError::ConfigValidationError { .. }
            | RefreshError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Network problems are usually worth a later rerun; a collision or a
    /// broken filesystem needs a human.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Encoding | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => match self {
                RefreshError::IoError(_) => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RefreshError::HttpError(_) | RefreshError::RetriesExhausted { .. } => {
                "The upstream source may be temporarily unavailable; rerun the download later"
                    .to_string()
            }
            RefreshError::DecodeError { url } => format!(
                "Check the content served by {} and whether its encoding has changed",
                url
            ),
            RefreshError::FileExists { .. } => {
                "Run with versioning enabled so a fresh _v# directory is used".to_string()
            }
            RefreshError::NoVersionedDirectory { .. } => {
                "Download sources first, or check the data directory path".to_string()
            }
            RefreshError::IoError(_) => {
                "Check that the data directory exists and is writable".to_string()
            }
            RefreshError::UnknownSourceGroup { .. } => {
                "Use the `sources` command to list available groups".to_string()
            }
            RefreshError::ConfigError { .. }
            | RefreshError::ConfigValidationError { .. }
            | RefreshError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and try again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Download failed: {}", self),
            ErrorCategory::Encoding => format!("Could not decode data: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RefreshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_message() {
        let err = RefreshError::RetriesExhausted {
            url: "https://example.com/a.csv".to_string(),
            attempts: 3,
            last_status: Some(503),
        };
        assert_eq!(
            err.to_string(),
            "Failed to retrieve https://example.com/a.csv after 3 attempt(s) (last status: 503)"
        );
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_file_exists_is_storage_error() {
        let err = RefreshError::FileExists {
            path: PathBuf::from("/tmp/a.csv"),
        };
        assert_eq!(err.to_string(), "/tmp/a.csv already exists");
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_http_client_error_exits_as_network_failure() {
        let err: RefreshError = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity().exit_code(), 2);
    }

    #[test]
    fn test_exit_codes_by_severity() {
        assert_eq!(ErrorSeverity::High.exit_code(), 1);
        assert_eq!(ErrorSeverity::Critical.exit_code(), 3);
        let io = RefreshError::IoError(std::io::Error::other("disk full"));
        assert_eq!(io.severity().exit_code(), 3);
    }

    #[test]
    fn test_no_versioned_directory_message() {
        let err = RefreshError::NoVersionedDirectory {
            dir: PathBuf::from("data/sources"),
            date: Some("2021-03-01".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "No versioned directory found in data/sources for 2021-03-01"
        );
    }
}
