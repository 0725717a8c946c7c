//! Logging setup for the CLI

use mcpide_core::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "mcpide.log";

/// Parse log level from config string
fn parse_log_level(level: &str) -> tracing::Level {
  match level.to_lowercase().as_str() {
    "off" | "error" => tracing::Level::ERROR,
    "warn" => tracing::Level::WARN,
    "info" => tracing::Level::INFO,
    "debug" => tracing::Level::DEBUG,
    "trace" => tracing::Level::TRACE,
    _ => tracing::Level::INFO,
  }
}

/// Initialize logging from config.
///
/// Console output goes to stderr so command output on stdout stays clean.
/// With `to_file`, logs go to the rolling file in the data directory instead.
///
/// Returns the guard that must be kept alive for the duration of the program
pub fn init_logging(config: &LoggingConfig, to_file: bool) -> Option<WorkerGuard> {
  let level = parse_log_level(&config.level);

  // RUST_LOG still overrides the configured level
  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  if !to_file {
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_ansi(true)
      .with_writer(std::io::stderr)
      .init();
    return None;
  }

  let log_dir = mcpide::dirs::default_log_dir();
  if std::fs::create_dir_all(&log_dir).is_err() {
    // Fall back to console-only logging
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_writer(std::io::stderr)
      .init();
    return None;
  }

  let file_appender = match config.rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(&log_dir, LOG_FILE_NAME),
    "never" => tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME),
    _ => tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME),
  };

  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .with_ansi(false)
    .with_writer(file_writer)
    .init();

  Some(guard)
}
