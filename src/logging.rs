use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn default_filter(debug: bool) -> &'static str {
    if debug { "cc_guard=debug" } else { "cc_guard=info" }
}

/// Install the global subscriber. `RUST_LOG` wins over the default filter.
///
/// Output goes to stderr so it never interleaves with the dashboard on stdout.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
