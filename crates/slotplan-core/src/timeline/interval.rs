//! Half-open time intervals.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A time range `[start, end)`.
///
/// Well-formed intervals have `start < end`. Intervals arriving through
/// serde are not checked on deserialization; the scheduler validates them
/// before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Create an interval, returning `None` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Create an interval of the given length starting at `start`.
    ///
    /// Returns `None` if the end falls outside the representable range.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Option<Self> {
        Self::new(start, start.checked_add_signed(length)?)
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Check if this interval can hold something of the given length
    pub fn can_fit(&self, length: Duration) -> bool {
        self.duration() >= length
    }

    /// Check if this interval overlaps with another (touching ends do not overlap)
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if `other` lies entirely inside this interval
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The overlapping part of two intervals, if any.
    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        TimeInterval::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Grow the interval by `before` at the start and `after` at the end,
    /// clamped to the representable range.
    pub fn extend(&self, before: Duration, after: Duration) -> TimeInterval {
        TimeInterval {
            start: self
                .start
                .checked_sub_signed(before)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: self
                .end
                .checked_add_signed(after)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Length of the part of `self` that falls outside `bounds`.
    pub fn overhang(&self, bounds: &TimeInterval) -> Duration {
        let inside = self
            .intersection(bounds)
            .map(|i| i.duration())
            .unwrap_or_else(Duration::zero);
        self.duration() - inside
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}
