//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// The filter comes from `MEDIAPULSE_LOG` (falling back to `RUST_LOG`, then
/// `info`). With `json` set, events are emitted as structured JSON lines for
/// log shippers. Safe to call more than once; later calls are no-ops.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env("MEDIAPULSE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    // A subscriber may already be installed by the embedding application.
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    drop(result);
}
