//! Tracing setup for the inspector binary
//!
//! Logs go to stderr so stdout stays clean for the printed tree. `RUST_LOG`
//! filters as usual; `LOG_FORMAT=json` switches to JSON lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives when `RUST_LOG` is unset
const DEFAULT_DIRECTIVES: &str = "bevy_inspector=info,inspector=info";

/// Initialize tracing, with `verbose` raising the crate level to debug
pub fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives)?,
        Err(_) if verbose => EnvFilter::try_new("bevy_inspector=debug,inspector=debug")?,
        Err(_) => EnvFilter::try_new(DEFAULT_DIRECTIVES)?,
    };

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
