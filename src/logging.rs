// Centralized logging setup for tracing with runtime log level, optional file logging, and structured output
use eyre::{Result, WrapErr};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock; // For global file guard
use tracing_subscriber::{
    fmt,
    EnvFilter,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

const CRATE_TARGET: &str = "mfapi_nav_viewer";
const LOG_DIR: &str = "logs";

static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

pub fn init_logging(bin_name: String) -> Result<()> {
    // Load log levels for console and file from env
    let console_log_level = env::var("CONSOLE_LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let file_log_level = env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());

    // Load file log flag from env
    let log_to_file = env::var("LOG_TO_FILE").unwrap_or_else(|_| "false".to_string()) == "true";

    // Console layer: pretty human-readable logs on stderr so stdout stays free for rendering
    let console_layer = fmt::Layer::new()
        .pretty()
        .with_writer(std::io::stderr)
        .with_filter(crate_filter(&console_log_level));

    if log_to_file {
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let log_dir = Path::new(LOG_DIR);
        fs::create_dir_all(log_dir).wrap_err("Failed to create log directory")?;
        let log_file_name = format!("{}_{}.log", bin_name, timestamp);

        let file_appender = tracing_appender::rolling::never(log_dir, &log_file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        FILE_GUARD.set(guard).ok(); // Store the guard globally

        // File layer: structured JSON logs with UTC timestamps
        let file_layer = fmt::Layer::new()
            .json()
            .with_writer(non_blocking)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(crate_filter(&file_log_level));

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .wrap_err("Failed to set global tracing subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .wrap_err("Failed to set global tracing subscriber")?;
    }

    Ok(())
}

// Filter globally to "warn", our own crate to the requested level
fn crate_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("warn,{}={}", CRATE_TARGET, level))
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}=info", CRATE_TARGET)))
}
