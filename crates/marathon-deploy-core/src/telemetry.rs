//! Tracing initialisation for the marathon-deploy binaries.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! since the global subscriber can only be set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset; the HTTP stack stays at `warn`.
fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::new(format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn",
        level.as_str()
    ))
}

/// Initialise the global tracing subscriber.
///
/// `json` switches to newline-delimited JSON. Logs go to stderr so stdout
/// stays free for command output.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let layer = if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .ok();
}
