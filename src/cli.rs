//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and environment fallbacks.

use crate::models::Thresholds;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

/// sortnag - overdue checkout reminders over SMS
///
/// Scans the purchasing record store for items checked out past the
/// warning threshold and texts each sorter one reminder covering all of
/// their items, with a copy to the escalation destination.
///
/// Examples:
///   sortnag --database purchasing.db --escalate-to +15550000
///   sortnag --dry-run --as-of 2026-10-17T12:00:00Z
///   sortnag --warning-days 5 --overdue-days 7 --format json
///   sortnag --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .sortnag.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database holding the checkout and users tables
    #[arg(short, long, value_name = "FILE", env = "SORTNAG_DATABASE")]
    pub database: Option<PathBuf>,

    /// Days since checkout that triggers the "due back tomorrow" reminder
    #[arg(long, value_name = "DAYS")]
    pub warning_days: Option<i64>,

    /// Days since checkout at which items are overdue
    #[arg(long, value_name = "DAYS")]
    pub overdue_days: Option<i64>,

    /// Phone number or alias that receives a copy of every reminder
    #[arg(short, long, value_name = "DEST", env = "SORTNAG_ESCALATE_TO")]
    pub escalate_to: Option<String>,

    /// Organization named in the message preamble
    #[arg(long, value_name = "NAME")]
    pub organization: Option<String>,

    /// Twilio account SID
    #[arg(long, env = "TWILIOSID", hide_env_values = true)]
    pub twilio_sid: Option<String>,

    /// Twilio auth token
    #[arg(long, env = "TWILIOTOKEN", hide_env_values = true)]
    pub twilio_token: Option<String>,

    /// Twilio number messages are sent from
    #[arg(long, env = "TWILIONUMBER")]
    pub twilio_number: Option<String>,

    /// Instant to treat as "now" when computing days since checkout (RFC 3339)
    ///
    /// Defaults to the current time. Useful for replaying a past scan.
    #[arg(long, value_name = "TIMESTAMP")]
    pub as_of: Option<DateTime<Utc>>,

    /// Log the messages that would be sent instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for the scan summary (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .sortnag.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the scan summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // A lone --warning-days is paired with the file's overdue days after the merge
        if let Some(warning_days) = self.warning_days {
            Thresholds {
                warning_days,
                overdue_days: self.overdue_days.unwrap_or(warning_days.saturating_add(1)),
            }
            .validate()?;
        }

        if let Some(ref database) = self.database {
            if !database.is_file() {
                return Err(format!("Database file does not exist: {}", database.display()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_args() -> Args {
        Args {
            config: None,
            database: None,
            warning_days: None,
            overdue_days: None,
            escalate_to: None,
            organization: None,
            twilio_sid: None,
            twilio_token: None,
            twilio_number: None,
            as_of: None,
            dry_run: false,
            format: OutputFormat::Text,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_thresholds() {
        let mut args = make_args();
        args.warning_days = Some(6);
        args.overdue_days = Some(6);
        assert!(args.validate().is_err());

        let expected = Thresholds {
            warning_days: 6,
            overdue_days: 6,
        }
        .validate()
        .unwrap_err();
        assert_eq!(args.validate().unwrap_err(), expected);

        args.overdue_days = Some(8);
        assert!(args.validate().is_ok());

        args.warning_days = Some(0);
        assert!(args.validate().is_err());

        args.warning_days = None;
        args.overdue_days = Some(3);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_database() {
        let mut args = make_args();
        args.database = Some(PathBuf::from("/nonexistent/purchasing.db"));
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_as_of_and_format() {
        let args = Args::parse_from([
            "sortnag",
            "--as-of",
            "2026-10-17T12:00:00Z",
            "--format",
            "json",
            "--dry-run",
        ]);
        assert_eq!(
            args.as_of,
            Some(Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap())
        );
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.dry_run);
    }
}
