use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HEARTMATCH_LOG";

/// Installs the stderr subscriber. Filter directives come from
/// `$HEARTMATCH_LOG`, defaulting to `info`. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
