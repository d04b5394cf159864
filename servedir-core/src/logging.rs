use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// JSON lines with flattened event fields.
    Json,
    /// Human-readable output for terminals.
    Pretty,
}

/// Pretty output on a terminal, JSON otherwise.
pub fn default_log_mode() -> LogMode {
    if io::stdout().is_terminal() {
        LogMode::Pretty
    } else {
        LogMode::Json
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` controls filtering (default `info`). With `TOKIO_CONSOLE` set,
/// the tokio-console subscriber is installed instead and `mode` is ignored.
pub fn init_logging(mode: LogMode) {
    if std::env::var("TOKIO_CONSOLE").is_ok() {
        console_subscriber::init();
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match mode {
        LogMode::Json => fmt()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .init(),
        LogMode::Pretty => fmt().with_env_filter(filter).with_target(false).init(),
    }
}
