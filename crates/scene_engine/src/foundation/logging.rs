//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

use log::LevelFilter;

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default level name such as `"info"`
///
/// `RUST_LOG` still takes precedence when set. Unknown level names fall back to `info`.
/// Calling this more than once is harmless.
pub fn init_with_level(level: &str) {
    let filter = parse_level(level).unwrap_or(LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
}

/// Parse a level name (case-insensitive)
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    level.trim().parse::<LevelFilter>().ok()
}
