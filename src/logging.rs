use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` or else the configured level.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // Only fails if a subscriber is already installed, which is fine.
    _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
