/// Initializes the global tracing subscriber from `RUST_LOG`, defaulting to
/// `info` for our own events.
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notifeed=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
