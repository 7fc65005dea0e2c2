use crate::config::toml_config::RefreshConfig;
use crate::utils::error::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "mtl-refresh")]
#[command(about = "Download COVID-19 data sources into dated, versioned directories")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override paths.data_dir from the configuration
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch source tables into data/sources/<date>[_v#]/
    Download {
        /// Source group to fetch (repeatable). Defaults to every group.
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// Reuse an existing directory for the date instead of adding _v#
        #[arg(long)]
        no_version: bool,

        /// Show the target directory and sources without fetching
        #[arg(long)]
        dry_run: bool,
    },
    /// Copy data/processed/ into data/processed_backups/<date>[_v#]/
    Backup,
    /// Print the latest sources directory
    Latest {
        /// Only consider directories for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List the configured source tables
    Sources,
}

impl CliConfig {
    /// Configuration file (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> Result<RefreshConfig> {
        let mut config = match &self.config {
            Some(path) => RefreshConfig::from_file(path)?,
            None => RefreshConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.paths.data_dir = data_dir.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_command() {
        let cli = CliConfig::try_parse_from([
            "mtl-refresh",
            "--data-dir",
            "/tmp/data",
            "download",
            "--group",
            "mtl",
            "-g",
            "inspq",
            "--no-version",
        ])
        .unwrap();

        match &cli.command {
            Command::Download {
                groups,
                no_version,
                dry_run,
            } => {
                assert_eq!(groups, &vec!["mtl".to_string(), "inspq".to_string()]);
                assert!(*no_version);
                assert!(!*dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let config = cli.load_config().unwrap();
        assert_eq!(config.paths.data_dir, "/tmp/data");
    }

    #[test]
    fn test_parse_latest_with_date() {
        let cli = CliConfig::try_parse_from(["mtl-refresh", "latest", "--date", "2021-03-01"]).unwrap();

        match cli.command {
            Command::Latest { date } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        assert!(CliConfig::try_parse_from(["mtl-refresh", "latest", "--date", "yesterday"]).is_err());
    }
}
