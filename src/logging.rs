/// Logging setup: terminal output plus daily-rotated text and JSON files.
///
/// With the default `log_config.file`:
/// - `logs/wilo_scraper.log.YYYY-MM-DD` - human-readable text
/// - `logs/wilo_scraper.json.log.YYYY-MM-DD` - structured JSON
///
/// `RUST_LOG` wins over the level from the settings file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Guards that flush the file writers when dropped. Keep them alive in `main`.
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Map a settings-file level ("INFO", "WARNING", ...) to a filter directive.
pub fn filter_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// `scrape.log` -> `scrape.json.log`
pub fn json_log_prefix(text_prefix: &str) -> String {
    match text_prefix.strip_suffix(".log") {
        Some(stem) => format!("{}.json.log", stem),
        None => format!("{}.json", text_prefix),
    }
}

/// Install the global subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset or invalid.
pub fn init_logging<P: AsRef<Path>>(
    log_dir: P,
    text_prefix: &str,
    default_level: &str,
) -> Result<LogGuards, Box<dyn std::error::Error + Send + Sync>> {
    let log_path = log_dir.as_ref();
    std::fs::create_dir_all(log_path)?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directive(default_level))?,
    };

    let text_file_appender = tracing_appender::rolling::daily(log_path, text_prefix);
    let (text_writer, text_guard) = tracing_appender::non_blocking(text_file_appender);

    let json_file_appender = tracing_appender::rolling::daily(log_path, json_log_prefix(text_prefix));
    let (json_writer, json_guard) = tracing_appender::non_blocking(json_file_appender);

    let text_layer = fmt::layer()
        .with_writer(text_writer)
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_filter(env_filter.clone());

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_target(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_filter(env_filter.clone());

    // Terminal stays terse; module paths go to the files
    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(stdout_layer)
        .try_init()?;

    tracing::debug!("Logging to {}", log_path.display());

    Ok(LogGuards {
        _guards: vec![text_guard, json_guard],
    })
}
