//! Logging initialisation via tracing-subscriber.
//!
//! The effective filter is, in order: the `-v` tier from the command line,
//! `RUST_LOG`, then the configured `[router] log_level` (which
//! `POLYGLOT_LOG_LEVEL` may already have overridden). Output goes to stderr
//! so it never interleaves with answers on stdout.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Map a count of `-v` flags to a level tier.
///
///   -v      → warn   (answers only, plus recovered failures)
///   -vv     → info   (startup and console lifecycle)
///   -vvv    → debug  (per-request routing decisions)
///   -vvvv+  → trace  (state transitions, raw model replies)
pub fn verbosity_level(count: u8) -> Option<LevelFilter> {
    match count {
        0 => None,
        1 => Some(LevelFilter::WARN),
        2 => Some(LevelFilter::INFO),
        3 => Some(LevelFilter::DEBUG),
        _ => Some(LevelFilter::TRACE),
    }
}

fn build_filter(verbosity: u8, rust_log: Option<&str>, configured: &str) -> Result<EnvFilter, AppError> {
    if let Some(level) = verbosity_level(verbosity) {
        return Ok(EnvFilter::new(level.to_string()));
    }
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| AppError::Logger(format!("invalid RUST_LOG '{directives}': {e}"))),
        None => EnvFilter::try_new(configured)
            .map_err(|e| AppError::Logger(format!("invalid log level '{configured}': {e}"))),
    }
}

/// Install the global subscriber and return the effective filter, for logging.
pub fn init(verbosity: u8, configured: &str) -> Result<String, AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, rust_log.as_deref(), configured)?;
    let effective = filter.to_string();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(effective)
}

/// Validate a configured level name. Directives are not accepted here.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
