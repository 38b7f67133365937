use tracing_subscriber::{EnvFilter, fmt};

/// Test-side logging only; the spawned `chirp` processes log to their own
/// stderr, which assertions print on failure.
pub fn init_test_logging() {
    let filter = EnvFilter::from_default_env()
        .add_directive("test=info".parse().unwrap())
        .add_directive("chirp_common=debug".parse().unwrap());
    let _ = fmt()
        .with_test_writer()
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}

#[macro_export]
macro_rules! test_log {
    ($($arg:tt)*) => {
        tracing::info!(target: "test", $($arg)*);
    };
}
