//! corona-tray - background process behind the COVID-19 tray display.
//!
//! Reads requests as JSON lines on stdin and writes replies as JSON lines on
//! stdout. Logs go to stderr and a daily-rolling file.

mod app;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use corona_core::{AppSettings, Config, DataAggregator, JsonFileStore, MemoryStore, SettingsStore};

use app::AppSession;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "corona-tray.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard must stay alive so buffered file logs are flushed.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn open_settings(config: &Config) -> Arc<dyn SettingsStore> {
    let opened = config
        .settings_dir()
        .and_then(|dir| JsonFileStore::open(&dir).map_err(anyhow::Error::from));
    match opened {
        Ok(store) => {
            info!(path = %store.path().display(), "Settings store opened");
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "Failed to open settings file, settings will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let _log_guard = init_tracing(&config);
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!("corona-tray starting");

    let settings = AppSettings::new(open_settings(&config));
    info!(
        open_at_login = settings.open_at_login(),
        mode = settings.location_mode().locate_style(),
        "Preferences loaded"
    );

    let client = Arc::new(config.api_client()?);
    let session = Arc::new(AppSession::new(DataAggregator::new(settings, client)));

    app::run(session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("corona-tray shutting down");
    Ok(())
}
