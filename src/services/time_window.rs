//! Time window resolution.
//!
//! Turns a user-supplied time specification into a concrete [`TimeWindow`].
//! Three forms are accepted:
//!
//! - A keyword from the fixed preset set (`1d`, `3d`, `7d`, `30d`, `90d`,
//!   `6m`, `1y`, `all`).
//! - A comma-separated ISO-8601 pair (`start,end`) for an explicit window.
//! - A relative pattern `<integer><unit>` with unit in `d/w/m/y`, mapped to
//!   the nearest preset.
//!
//! Relative patterns only map the specific magnitudes the preset table
//! covers; anything else (`45d`, `14d`) silently falls back to the 7-day
//! default, as does unparseable input. The fallback is a documented
//! compatibility quirk and must not be "fixed" here.
//!
//! Preset and relative windows end at resolution time, so two calls made
//! seconds apart yield slightly different absolute windows. Windows are
//! never cached across calls.

use crate::models::TimeWindow;
use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Predefined time range presets with fixed durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRangePreset {
    /// Last 24 hours.
    OneDay,
    /// Last 3 days.
    ThreeDays,
    /// Last 7 days. The default.
    SevenDays,
    /// Last 30 days.
    ThirtyDays,
    /// Last 90 days.
    NinetyDays,
    /// Last 180 days.
    SixMonths,
    /// Last 365 days.
    OneYear,
    /// Unbounded.
    All,
}

impl TimeRangePreset {
    /// Returns the preset as its keyword spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
            Self::NinetyDays => "90d",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
            Self::All => "all",
        }
    }

    /// Parses a preset keyword.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "1d" => Some(Self::OneDay),
            "3d" => Some(Self::ThreeDays),
            "7d" => Some(Self::SevenDays),
            "30d" => Some(Self::ThirtyDays),
            "90d" => Some(Self::NinetyDays),
            "6m" => Some(Self::SixMonths),
            "1y" => Some(Self::OneYear),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Duration of the preset in days, `None` for [`TimeRangePreset::All`].
    #[must_use]
    pub const fn duration_days(&self) -> Option<i64> {
        match self {
            Self::OneDay => Some(1),
            Self::ThreeDays => Some(3),
            Self::SevenDays => Some(7),
            Self::ThirtyDays => Some(30),
            Self::NinetyDays => Some(90),
            Self::SixMonths => Some(180),
            Self::OneYear => Some(365),
            Self::All => None,
        }
    }

    /// Resolves the preset into a concrete window ending now.
    #[must_use]
    pub fn window_at(&self, now: DateTime<Utc>) -> TimeWindow {
        self.duration_days().map_or_else(TimeWindow::unbounded, |days| {
            TimeWindow::between(now - Duration::days(days), now)
        })
    }
}

static RELATIVE_RANGE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\d+)([dwmy])$").ok());

/// Resolves a time specification into a window, relative to the current time.
///
/// Falls back to the default 7-day window for anything it cannot interpret.
#[must_use]
pub fn resolve_window(spec: &str) -> TimeWindow {
    resolve_window_at(spec, Utc::now())
}

/// Resolves a time specification against an explicit "now".
///
/// Exposed separately so callers (and tests) can pin the resolution instant.
#[must_use]
pub fn resolve_window_at(spec: &str, now: DateTime<Utc>) -> TimeWindow {
    let spec = spec.trim();

    if let Some(preset) = TimeRangePreset::parse(spec) {
        return preset.window_at(now);
    }

    if spec.contains(',') {
        match parse_explicit_range(spec) {
            Ok(window) => return window,
            Err(e) => {
                // Recovered, not propagated: malformed explicit ranges fall
                // back to the default window.
                warn!(spec, error = %e, "Falling back to default time window");
                return TimeRangePreset::SevenDays.window_at(now);
            },
        }
    }

    relative_preset(spec)
        .unwrap_or(TimeRangePreset::SevenDays)
        .window_at(now)
}

/// Parses an explicit `start,end` ISO-8601 pair.
///
/// Date-only inputs resolve to midnight UTC.
///
/// # Errors
///
/// Returns [`Error::InvalidRange`] if the spec is not a two-part pair or
/// either half fails to parse as a calendar timestamp.
pub fn parse_explicit_range(spec: &str) -> Result<TimeWindow> {
    let invalid = || Error::InvalidRange {
        spec: spec.to_string(),
    };

    let mut parts = spec.splitn(2, ',');
    let start = parts.next().map(str::trim).ok_or_else(invalid)?;
    let end = parts.next().map(str::trim).ok_or_else(invalid)?;

    let start = parse_iso_timestamp(start).ok_or_else(invalid)?;
    let end = parse_iso_timestamp(end).ok_or_else(invalid)?;

    Ok(TimeWindow::between(start, end))
}

/// Parses an ISO-8601 timestamp or calendar date into UTC.
fn parse_iso_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Maps a relative `<integer><unit>` pattern onto a preset.
///
/// Only the magnitudes the preset table covers are mapped; combinations with
/// no exact preset (`45d`, `2w`, `3m`) return `None` and the caller falls
/// back to the default. Nothing is interpolated.
fn relative_preset(spec: &str) -> Option<TimeRangePreset> {
    let lowered = spec.to_lowercase();
    let captures = RELATIVE_RANGE.as_ref()?.captures(&lowered)?;
    let value: u32 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2)?.as_str();

    match (unit, value) {
        ("d", 1) => Some(TimeRangePreset::OneDay),
        ("d", 7) | ("w", 1) => Some(TimeRangePreset::SevenDays),
        ("d", 30) | ("m", 1) => Some(TimeRangePreset::ThirtyDays),
        ("d", 90) => Some(TimeRangePreset::NinetyDays),
        ("m", 6) => Some(TimeRangePreset::SixMonths),
        ("y", 1) => Some(TimeRangePreset::OneYear),
        _ => None,
    }
}
