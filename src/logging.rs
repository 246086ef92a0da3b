use tracing_subscriber::EnvFilter;

/// Default filter when RUST_LOG is unset or unparsable.
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber for the binary.
///
/// The filter is read from RUST_LOG (e.g. `RUST_LOG=cisl=debug`). Events go
/// to stderr so stdout only carries program output.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Installs a trace-level subscriber for unit tests, once per test binary.
#[cfg(test)]
pub fn init_test_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter("cisl=trace")
            .with_test_writer()
            .try_init();
    });
}
