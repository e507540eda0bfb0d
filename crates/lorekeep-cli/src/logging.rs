//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber
///
/// `verbose` forces debug output for the lorekeep crates. Otherwise
/// `RUST_LOG` applies when set, falling back to `default_level`.
pub fn init(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("lorekeep=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("lorekeep={default_level}")))
    };

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
