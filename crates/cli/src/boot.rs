//! Boot: logging init.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the tracing / logging subsystem. Logs go to stderr so stdout
/// only carries issues.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "msbuild_issues=debug"
    } else {
        "msbuild_issues=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
