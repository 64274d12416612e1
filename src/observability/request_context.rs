//! Per-request correlation ids.
//!
//! The engine is synchronous, so a request is scoped to the thread that
//! runs it. Entering a context assigns a fresh UUID that log statements can
//! attach; contexts nest, with the guard restoring the previous id on drop.

use std::cell::RefCell;
use uuid::Uuid;

thread_local! {
    static REQUEST_ID: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Restores the previous request id when dropped.
#[must_use = "the context ends when the guard is dropped"]
pub struct RequestContextGuard {
    previous: Option<String>,
}

impl Drop for RequestContextGuard {
    fn drop(&mut self) {
        REQUEST_ID.with(|cell| {
            *cell.borrow_mut() = self.previous.take();
        });
    }
}

/// Enters a new request context with a fresh correlation id.
pub fn enter_request_context() -> RequestContextGuard {
    let id = Uuid::new_v4().to_string();
    let previous = REQUEST_ID.with(|cell| cell.borrow_mut().replace(id));
    RequestContextGuard { previous }
}

/// The current thread's request id, if inside a context.
#[must_use]
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.with(|cell| cell.borrow().clone())
}
