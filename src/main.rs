//! ShadowPilot - shadow assistant for admin console configuration workflows
//!
//! Main entry point for the ShadowPilot CLI.

mod cli;
mod cmd_inspect;
mod cmd_replay;

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shadowpilot_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use cli::{Cli, Commands};

/// Get the .shadowpilot directory path.
fn shadowpilot_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".shadowpilot"))
        .unwrap_or_else(|| PathBuf::from(".shadowpilot"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to `logging.directory` (default ~/.shadowpilot/logs/)
/// with daily rotation.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = logging
        .directory
        .clone()
        .unwrap_or_else(|| shadowpilot_dir().join("logs"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .max_log_files(30)
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ConfigLoader::load_or_default(&cli.config)?;
    init_tracing(&config.logging)?;
    info!("ShadowPilot v{} (config: {})", env!("CARGO_PKG_VERSION"), cli.config.display());

    let result = match cli.command {
        Commands::Replay {
            session,
            assume_authenticated,
        } => cmd_replay::run(&config, &session, assume_authenticated).await,
        Commands::Inspect { page, focus } => cmd_inspect::run(&config, &page, focus.as_deref()),
        Commands::CheckConfig => check_config(&config),
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

fn check_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    let warnings = result.into_result()?;
    println!("Configuration OK ({} warnings)", warnings.len());
    Ok(())
}
