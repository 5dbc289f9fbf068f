//! Diagnostic logging via `tracing`. The user-facing scan log travels on the
//! event stream; this is for operators debugging the scanner itself.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a compact stderr subscriber. `RUST_LOG` wins when set; otherwise
/// `warn`, or `debug` for this crate when `verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "warn,llm_scan_rs=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true);

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
