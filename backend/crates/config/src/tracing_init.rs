use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber for a plugin process.
///
/// The filter comes from `RUST_LOG`, then `LOG_LEVEL`, then `default_level`.
/// Calling this twice is harmless: the second subscriber is dropped.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}
