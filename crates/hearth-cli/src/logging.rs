use hearth_core::Configuration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &Configuration) {
    let level = config.log_level.as_filter();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hearth={level},hearth_core={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
