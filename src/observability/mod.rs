//! Logging and request correlation.
//!
//! Metrics are emitted through the `metrics` facade at call sites; wiring an
//! exporter is the embedding application's job.

mod logging;
mod request_context;

pub use logging::init_logging;
pub use request_context::{RequestContextGuard, current_request_id, enter_request_context};
