//! sortnag - overdue checkout reminders over SMS
//!
//! Scans the purchasing record store for items checked out past a grace
//! period and texts each responsible sorter one reminder, with a copy to
//! an escalation destination.
//!
//! Exit codes:
//!   0 - Scan completed and every notification was delivered
//!   1 - Runtime error (config, record store unavailable, etc.)
//!   2 - Scan completed but one or more notifications failed

mod analysis;
mod cli;
mod config;
mod dispatch;
mod error;
mod models;
mod notify;
mod report;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use dispatch::Dispatcher;
use notify::{LogSender, NotificationSender, TwilioSender};
use report::Composer;
use store::SqliteSource;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the log level, so it is loaded before logging starts
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_level(args.quiet))?;

    info!("sortnag v{}", env!("CARGO_PKG_VERSION"));
    debug!("Dry run: {}, format: {:?}", args.dry_run, args.format);

    match run_scan(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Scan failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sortnag.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .sortnag.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .sortnag.toml")?;

    println!("✅ Created .sortnag.toml with default settings.");
    println!("   Edit it to set the database, thresholds and escalation destination.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run one scan. Returns the exit code (0, 1 or 2).
async fn run_scan(args: Args, config: Config) -> Result<i32> {
    config
        .validate(args.dry_run)
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    let escalation = config.escalation_destination();
    if escalation.is_none() {
        warn!("No escalation destination configured; reminders go to sorters only");
    }

    let as_of = args.as_of.unwrap_or_else(Utc::now);
    info!("Computing days since checkout as of {}", as_of.to_rfc3339());

    let source = SqliteSource::new(
        &config.store.database,
        config.store.checkout_table.clone(),
        config.store.users_table.clone(),
        as_of,
    );

    let sender: Box<dyn NotificationSender> = if args.dry_run {
        info!("Dry run: messages will be logged, not sent");
        Box::new(LogSender)
    } else {
        Box::new(TwilioSender::new(&config.sms)?)
    };
    info!("Sending through {}", sender.name());

    let composer = Composer::new(
        config.general.organization.clone(),
        config.thresholds.thresholds(),
    );

    let dispatcher = Dispatcher::new(Box::new(source), sender, composer, escalation);
    let result = dispatcher.run().await;

    match args.format {
        OutputFormat::Json => println!("{}", report::render_json(&result)?),
        OutputFormat::Text => {
            if !args.quiet {
                println!("{}", report::render_text(&result));
            }
        }
    }

    if result.is_fatal() {
        return Ok(1);
    }

    if result.send_failures() > 0 {
        eprintln!(
            "\n⛔ {} notification(s) failed. Failing (exit code 2).",
            result.send_failures()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from `--config` or `.sortnag.toml`, falling back to
/// defaults only when no file exists, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref config_path) => Config::load(config_path)?,
        None => Config::load_default()
            .context("Failed to load .sortnag.toml")?
            .unwrap_or_default(),
    };

    config.merge_with_args(args);
    Ok(config)
}
