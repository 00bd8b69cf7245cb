use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber for the binaries. `RUST_LOG` wins over the
/// configured filter. Output goes to stderr so the CLI's stdout stays clean.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
