//! Time window types for query filtering.
//!
//! A [`TimeWindow`] is a concrete date interval produced by the time window
//! resolver (`services::time_window`). Windows are never mutated after
//! creation; the query orchestrator consumes them as read-only filter
//! predicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved time interval, half-open `[start, end)` on each bounded side.
///
/// Both bounds `None` means "all time".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive), `None` for unbounded past.
    pub start: Option<DateTime<Utc>>,
    /// End of the window (exclusive), `None` for unbounded future.
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Creates an unbounded window (all time).
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Creates a bounded window.
    #[must_use]
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Creates a window starting at a given timestamp, unbounded future.
    #[must_use]
    pub const fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Creates a window ending at a given timestamp, unbounded past.
    #[must_use]
    pub const fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Checks whether the given timestamp falls within this window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let after_start = self.start.is_none_or(|s| timestamp >= s);
        let before_end = self.end.is_none_or(|e| timestamp < e);
        after_start && before_end
    }

    /// Checks whether the window is unbounded on both ends.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "[all time)"),
            (Some(s), None) => write!(f, "[{s}, ∞)"),
            (None, Some(e)) => write!(f, "[∞, {e})"),
            (Some(s), Some(e)) => write!(f, "[{s}, {e})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn test_unbounded_contains_everything() {
        let w = TimeWindow::unbounded();
        assert!(w.is_unbounded());
        assert!(w.contains(ts(1)));
        assert!(w.contains(ts(31)));
    }

    #[test]
    fn test_between_half_open() {
        let w = TimeWindow::between(ts(10), ts(20));
        assert!(!w.contains(ts(9)));
        assert!(w.contains(ts(10)));
        assert!(w.contains(ts(19)));
        assert!(!w.contains(ts(20))); // end is exclusive
    }

    #[test]
    fn test_since_and_until() {
        assert!(TimeWindow::since(ts(10)).contains(ts(25)));
        assert!(!TimeWindow::since(ts(10)).contains(ts(9)));
        assert!(TimeWindow::until(ts(10)).contains(ts(9)));
        assert!(!TimeWindow::until(ts(10)).contains(ts(10)));
    }

    #[test]
    fn test_default_is_unbounded() {
        assert!(TimeWindow::default().is_unbounded());
    }
}
