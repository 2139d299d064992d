//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sortnag.toml` files.

use crate::models::Thresholds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".sortnag.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Reminder thresholds.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// SMS gateway settings.
    #[serde(default)]
    pub sms: SmsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Organization named in the message preamble.
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Manager phone or alias that receives a copy of every reminder.
    #[serde(default)]
    pub escalation_destination: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            escalation_destination: String::new(),
            verbose: false,
        }
    }
}

fn default_organization() -> String {
    crate::report::composer::DEFAULT_ORGANIZATION.to_string()
}

/// Days-since-checkout thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Items checked out exactly this many days get a "due tomorrow" reminder.
    #[serde(default = "default_warning_days")]
    pub warning_days: i64,

    /// Items checked out at least this many days are overdue.
    #[serde(default = "default_overdue_days")]
    pub overdue_days: i64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            warning_days: default_warning_days(),
            overdue_days: default_overdue_days(),
        }
    }
}

fn default_warning_days() -> i64 {
    6
}

fn default_overdue_days() -> i64 {
    8
}

impl ThresholdsConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            warning_days: self.warning_days,
            overdue_days: self.overdue_days,
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite database.
    #[serde(default = "default_database")]
    pub database: String,

    /// Table of checkout records (sku, sorter, checkout, checkin).
    #[serde(default = "default_checkout_table")]
    pub checkout_table: String,

    /// Table of users (username, phone).
    #[serde(default = "default_users_table")]
    pub users_table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            checkout_table: default_checkout_table(),
            users_table: default_users_table(),
        }
    }
}

fn default_database() -> String {
    "purchasing.db".to_string()
}

fn default_checkout_table() -> String {
    "sortrequest".to_string()
}

fn default_users_table() -> String {
    "users".to_string()
}

/// SMS gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Base URL of the Twilio REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub account_sid: String,

    #[serde(default)]
    pub auth_token: String,

    /// Number messages are sent from.
    #[serde(default)]
    pub from_number: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_if_exists(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load `path` if it exists. A file that exists but can't be parsed is an error.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment fallbacks) take precedence
    /// over config file settings, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(days) = args.warning_days {
            self.thresholds.warning_days = days;
        }
        if let Some(days) = args.overdue_days {
            self.thresholds.overdue_days = days;
        }

        if let Some(ref destination) = args.escalate_to {
            self.general.escalation_destination = destination.clone();
        }
        if let Some(ref organization) = args.organization {
            self.general.organization = organization.clone();
        }

        if let Some(ref database) = args.database {
            self.store.database = database.display().to_string();
        }

        if let Some(ref sid) = args.twilio_sid {
            self.sms.account_sid = sid.clone();
        }
        if let Some(ref token) = args.twilio_token {
            self.sms.auth_token = token.clone();
        }
        if let Some(ref number) = args.twilio_number {
            self.sms.from_number = number.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the merged configuration before a scan.
    ///
    /// SMS credentials are only required when messages will really be sent.
    pub fn validate(&self, dry_run: bool) -> Result<(), String> {
        self.thresholds.thresholds().validate()?;

        if self.store.database.trim().is_empty() {
            return Err("Database path must not be empty".to_string());
        }

        if dry_run {
            return Ok(());
        }

        let missing: Vec<&str> = [
            ("TWILIOSID", &self.sms.account_sid),
            ("TWILIOTOKEN", &self.sms.auth_token),
            ("TWILIONUMBER", &self.sms.from_number),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(format!(
                "Missing SMS credentials: {} (set them or use --dry-run)",
                missing.join(", ")
            ));
        }

        if self.sms.timeout_seconds == 0 {
            return Err("SMS timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Log level for the merged settings. `--quiet` wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Escalation destination, if one is configured.
    pub fn escalation_destination(&self) -> Option<String> {
        let destination = self.general.escalation_destination.trim();
        (!destination.is_empty()).then(|| destination.to_string())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
