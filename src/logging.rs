//! Log initialization for the binary.

use crate::config::LOG_ENV;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber.
///
/// The filter comes from `level` when given, otherwise `PROCWARDEN_LOG`,
/// otherwise `RUST_LOG`, otherwise a warn-level default so interactive output
/// stays readable.
pub fn init(level: Option<&str>) -> anyhow::Result<()> {
    let env_filter = if let Some(level) = level {
        EnvFilter::try_new(level)?
    } else if let Ok(filter) = std::env::var(LOG_ENV) {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,procwarden=info"))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
