use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Installs the global subscriber, writing to stderr so stdout stays clean for
/// CLI JSON output. `RUST_LOG` takes precedence over `level`.
///
/// Safe to call more than once; only the first call has any effect.
pub fn init_tracing(level: &str) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

        let installed = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init();

        if installed.is_ok() {
            tracing::debug!(level, "tracing initialized");
        }
    });
}

fn default_filter(level: &str) -> String {
    format!("forecast={level}")
}
