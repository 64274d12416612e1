//! Retention cleanup.

mod retention;

pub use retention::{RetentionManager, RetentionResult};
