use crate::core::calendar::ReportingCalendar;
use crate::domain::model::SourceTable;
use crate::domain::sources::builtin_tables;
use crate::utils::error::{RefreshError, Result};
use crate::utils::validation::{
    validate_filename, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "./app/data";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEZONE: &str = "America/Montreal";
pub const DEFAULT_REPORTING_LAG_DAYS: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub paths: PathsConfig,
    pub fetch: FetchSettings,
    pub calendar: CalendarConfig,
    /// Replace the built-in table with the same name, or add a new one.
    pub tables: Vec<SourceTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
        }
    }
}

impl PathsConfig {
    pub fn sources_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("sources")
    }

    pub fn processed_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("processed")
    }

    pub fn processed_backups_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("processed_backups")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub max_attempts: u32,
    /// Fixed pause between attempts. Zero retries immediately.
    pub retry_delay_ms: u64,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 0,
            timeout_seconds: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub timezone: String,
    pub reporting_lag_days: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            reporting_lag_days: DEFAULT_REPORTING_LAG_DAYS,
        }
    }
}

impl CalendarConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| RefreshError::InvalidConfigValueError {
                field: "calendar.timezone".to_string(),
                value: self.timezone.clone(),
                reason: e.to_string(),
            })
    }

    pub fn to_calendar(&self) -> Result<ReportingCalendar> {
        Ok(ReportingCalendar::new(
            self.timezone()?,
            self.reporting_lag_days,
        ))
    }
}

impl RefreshConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RefreshError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RefreshError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RefreshError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Built-in tables in their usual order, with configured tables
    /// replacing same-named ones and new ones appended.
    pub fn source_tables(&self) -> Vec<SourceTable> {
        let mut tables = builtin_tables();
        for custom in &self.tables {
            match tables.iter_mut().find(|t| t.name == custom.name) {
                Some(existing) => *existing = custom.clone(),
                None => tables.push(custom.clone()),
            }
        }
        tables
    }

    pub fn source_table(&self, name: &str) -> Result<SourceTable> {
        self.source_tables()
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RefreshError::UnknownSourceGroup {
                name: name.to_string(),
            })
    }

    /// Tables named in `names`, in that order; every table when empty.
    pub fn select_tables(&self, names: &[String]) -> Result<Vec<SourceTable>> {
        if names.is_empty() {
            return Ok(self.source_tables());
        }
        names.iter().map(|name| self.source_table(name)).collect()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("paths.data_dir", &self.paths.data_dir)?;
        validate_positive_number("fetch.max_attempts", self.fetch.max_attempts, 1)?;
        self.calendar.timezone()?;

        let mut names = HashSet::new();
        for table in &self.tables {
            validate_non_empty_string("tables.name", &table.name)?;
            if !names.insert(table.name.to_lowercase()) {
                return Err(RefreshError::ConfigValidationError {
                    field: "tables.name".to_string(),
                    message: format!("Table '{}' is defined more than once", table.name),
                });
            }

            let mut filenames = HashSet::new();
            for entry in &table.entries {
                validate_filename("tables.entries.filename", &entry.filename)?;
                validate_url("tables.entries.url", &entry.url)?;
                if !filenames.insert(entry.filename.as_str()) {
                    return Err(RefreshError::ConfigValidationError {
                        field: "tables.entries.filename".to_string(),
                        message: format!(
                            "'{}' appears more than once in table '{}'",
                            entry.filename, table.name
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Validate for RefreshConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
