//! Logger resource
//!
//! Log output goes to standard error through a `tracing_subscriber` fmt
//! subscriber. The subscriber is installed as the default for the session's
//! thread and removed when the returned [`LoggerGuard`] is dropped.
//!
//! Verbosity starts at WARN; each `-v` moves one level (INFO, DEBUG, TRACE).
//! Below DEBUG lines carry only the message, without level or target.

use tracing::subscriber::DefaultGuard;
use tracing::Level;

/// Keeps the session logger installed until dropped
#[must_use = "dropping the guard uninstalls the logger"]
pub struct LoggerGuard {
    _default: DefaultGuard,
}

impl std::fmt::Debug for LoggerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LoggerGuard")
    }
}

/// Log level for a `-v` count
#[must_use]
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the session logger
pub fn init(verbosity: u8) -> LoggerGuard {
    let level = level_for(verbosity);
    let detailed = level >= Level::DEBUG;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_level(detailed)
        .with_target(detailed)
        .finish();

    LoggerGuard { _default: tracing::subscriber::set_default(subscriber) }
}
