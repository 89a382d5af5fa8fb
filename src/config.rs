//! Configuration for the coffee-monitor CLI
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::list::DEFAULT_PAGE_SIZE;

/// Session file used when `SESSION_FILE` is not set
pub const DEFAULT_SESSION_FILE: &str = ".coffee-monitor-session.json";

/// Coffee Monitor - beneficiary monitoring dashboard client
#[derive(Parser, Debug, Clone)]
#[command(name = "coffee-monitor")]
#[command(about = "Back-office client for coffee-farm beneficiary monitoring")]
pub struct Args {
    /// Base URL of the monitoring API (including the /api prefix)
    #[arg(long, env = "API_URL", default_value = "http://localhost:5000/api")]
    pub api_url: String,

    /// Host that serves uploaded pictures
    #[arg(long, env = "UPLOAD_URL", default_value = "http://localhost:5000")]
    pub upload_url: String,

    /// Where the session token is persisted between invocations
    #[arg(long, env = "SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Rows per page for list commands
    #[arg(long, env = "PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Authenticate and store the session
    Login {
        #[arg(long, short)]
        username: String,
        #[arg(long, short, env = "COFFEE_MONITOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Dashboard totals
    Stats,
    /// List beneficiaries
    Beneficiaries(ListArgs),
    /// List seedling distribution records
    Seedlings(ListArgs),
    /// List crop status surveys
    CropStatus(ListArgs),
    /// List farm plots
    FarmPlots(ListArgs),
    /// Walk the address reference data
    Provinces {
        /// Show municipalities of this province
        #[arg(long)]
        province: Option<String>,
        /// Show barangays of this municipality (requires --province)
        #[arg(long, requires = "province")]
        municipality: Option<String>,
    },
}

impl Command {
    /// Commands that need a session; maps to the view they stand in for
    pub fn destination(&self) -> Option<&'static str> {
        match self {
            Command::Login { .. } | Command::Logout => None,
            Command::Whoami | Command::Stats => Some("/dashboard"),
            Command::Beneficiaries(_) => Some("/beneficiaries"),
            Command::Seedlings(_) => Some("/seedlings"),
            Command::CropStatus(_) => Some("/crop-status"),
            Command::FarmPlots(_) => Some("/farm-plots"),
            Command::Provinces { .. } => Some("/beneficiaries"),
        }
    }
}

/// Options shared by the list subcommands
#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Column to sort by; repeat to cycle asc, desc, server order
    #[arg(long)]
    pub sort: Vec<String>,

    /// Free-text filter
    #[arg(long)]
    pub search: Option<String>,

    /// 1-based page number
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Override the configured page size
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_URL must be an http(s) URL, got {0:?}")]
    ApiUrl(String),
    #[error("UPLOAD_URL must be an http(s) URL, got {0:?}")]
    UploadUrl(String),
    #[error("PAGE_SIZE must be at least 1")]
    PageSize,
    #[error("REQUEST_TIMEOUT_MS must be at least 1")]
    Timeout,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.api_url) {
            return Err(ConfigError::ApiUrl(self.api_url.clone()));
        }
        if !is_http_url(&self.upload_url) {
            return Err(ConfigError::UploadUrl(self.upload_url.clone()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::PageSize);
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Timeout);
        }
        Ok(())
    }

    /// Resolved session file path
    pub fn session_path(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["coffee-monitor", "--api-url", "http://localhost:5000/api", "stats"]);
        assert_eq!(args.command, Command::Stats);
        assert_eq!(args.request_timeout_ms, 30_000);
        assert!(args.validate().is_ok());
        assert_eq!(args.command.destination(), Some("/dashboard"));
    }

    #[test]
    fn test_list_args() {
        let args = parse(&[
            "coffee-monitor",
            "--page-size",
            "5",
            "seedlings",
            "--sort",
            "planted",
            "--sort",
            "planted",
            "--search",
            "Plot A",
            "--page",
            "2",
        ]);
        assert_eq!(args.page_size, 5);
        match args.command {
            Command::Seedlings(list) => {
                assert_eq!(list.sort, vec!["planted", "planted"]);
                assert_eq!(list.search.as_deref(), Some("Plot A"));
                assert_eq!(list.page, 2);
                assert_eq!(list.page_size, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut args = parse(&["coffee-monitor", "logout"]);
        args.api_url = "localhost:5000".into();
        assert_eq!(args.validate(), Err(ConfigError::ApiUrl("localhost:5000".into())));

        args.api_url = "https://monitor.example/api".into();
        args.page_size = 0;
        assert_eq!(args.validate(), Err(ConfigError::PageSize));
        assert_eq!(args.command.destination(), None);
    }

    #[test]
    fn test_municipality_requires_province() {
        assert!(Args::try_parse_from(["coffee-monitor", "provinces", "--municipality", "X"]).is_err());
        let args = parse(&["coffee-monitor", "provinces", "--province", "Bukidnon"]);
        assert_eq!(
            args.command,
            Command::Provinces {
                province: Some("Bukidnon".into()),
                municipality: None
            }
        );
    }
}
