//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events. Hosts that have no subscriber
//! of their own call [`init`] once; the filter comes from `SOFTKBD_LOG`
//! (any `EnvFilter` directive, default `warn`) and output goes to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use tracing_subscriber::util::TryInitError;

/// Environment variable holding the filter directive.
pub const ENV_LOG: &str = "SOFTKBD_LOG";

/// Directive used when `SOFTKBD_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber.
///
/// Fails when a global subscriber is already set, whoever installed it.
pub fn init() -> Result<(), TryInitError> {
    let filter = filter_from(std::env::var(ENV_LOG).ok().as_deref());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
}

/// Filter for a `SOFTKBD_LOG` value.
pub fn filter_from(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(directive) if !directive.trim().is_empty() => {
            EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
        }
        _ => EnvFilter::new(DEFAULT_DIRECTIVE),
    }
}
