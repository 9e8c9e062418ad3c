//! Process lifecycle helpers.

/// Initialize logging with tracing_subscriber.
///
/// The tracing-log bridge captures the `log::` macros used throughout the
/// crate. `RUST_LOG` overrides the defaults.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reqwest=warn".parse().unwrap())
                .add_directive("boampscan=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .compact()
        .with_target(false)
        .with_ansi(true)
        .init();
}
