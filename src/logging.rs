use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// With `debug` the default level is `debug` and `RUST_LOG` may override it; otherwise the
/// level is fixed at `info`. Calling this twice is harmless.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
