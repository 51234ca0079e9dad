//! Schedule types: tasks, slots, busy intervals and the result of a run.
//!
//! Everything here is plain data. Inputs are built by the caller (a UI, a
//! stored plan file, a calendar reader), consumed by one call to
//! [`crate::scheduler::schedule`], and the [`ScheduleResult`] is handed to a
//! calendar writer. Nothing is kept between runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::timeline::TimeInterval;

/// Upper bound for task estimates and slot tolerances, in minutes (366 days).
pub const MAX_DURATION_MINUTES: i64 = 366 * 24 * 60;

/// A unit of work waiting in the backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within a run.
    pub name: String,
    /// Higher is more important.
    pub priority: u32,
    /// Estimated duration in minutes. Must be positive and at most
    /// [`MAX_DURATION_MINUTES`].
    pub estimated_minutes: i64,
    /// Informational label.
    #[serde(default)]
    pub category: String,
    /// Advisory only. Used for tie-breaking, never enforced.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(name: impl Into<String>, priority: u32, estimated_minutes: i64) -> Self {
        Self {
            name: name.into(),
            priority,
            estimated_minutes,
            category: String::new(),
            due_date: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Saturates for estimates chrono cannot represent; runs reject those
    /// before they get here.
    pub fn estimated_duration(&self) -> Duration {
        Duration::try_minutes(self.estimated_minutes).unwrap_or(Duration::MAX)
    }
}

/// How strictly a slot's end is respected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Placements must stay inside the slot.
    #[default]
    Hard,
    /// Placements may spill over the slot edges, up to the slot's tolerance.
    Soft,
}

/// A user-declared availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub interval: TimeInterval,
    #[serde(default)]
    pub boundary: BoundaryMode,
    /// Per-slot overflow tolerance. Falls back to the configured default
    /// rule when unset; ignored for hard slots. Must lie within
    /// `0..=MAX_DURATION_MINUTES`.
    #[serde(default)]
    pub tolerance_minutes: Option<i64>,
}

impl Slot {
    pub fn hard(interval: TimeInterval) -> Self {
        Self {
            label: None,
            interval,
            boundary: BoundaryMode::Hard,
            tolerance_minutes: None,
        }
    }

    pub fn soft(interval: TimeInterval) -> Self {
        Self {
            boundary: BoundaryMode::Soft,
            ..Self::hard(interval)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_tolerance_minutes(mut self, minutes: i64) -> Self {
        self.tolerance_minutes = Some(minutes);
        self
    }

    pub fn is_soft(&self) -> bool {
        self.boundary == BoundaryMode::Soft
    }
}

/// An existing calendar commitment. Blocks placement everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub interval: TimeInterval,
}

impl BusyInterval {
    pub fn new(interval: TimeInterval) -> Self {
        Self {
            label: None,
            interval,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A task committed to a concrete time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub task: Task,
    pub interval: TimeInterval,
    /// Declaration index of the slot in the run's input.
    pub slot_index: usize,
    pub slot: Slot,
    /// Time spent outside the slot's nominal span, in seconds.
    #[serde(default)]
    pub overflow_seconds: i64,
}

impl Placement {
    pub fn overflow(&self) -> Duration {
        Duration::seconds(self.overflow_seconds)
    }

    pub fn is_overflow(&self) -> bool {
        self.overflow_seconds > 0
    }
}

/// Why a task was left out of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// No free sub-interval, and no soft extension, could hold the task.
    NoCapacity,
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCapacity => write!(f, "no_capacity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedTask {
    pub task: Task,
    pub reason: UnplacedReason,
}

/// Per-slot diagnostics for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUsage {
    pub slot_index: usize,
    pub boundary: BoundaryMode,
    pub tolerance_seconds: i64,
    pub overflow_used_seconds: i64,
    pub placed: usize,
    /// Free time left inside the slot's nominal span, in seconds.
    pub free_seconds_left: i64,
}

/// Outcome of one scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Ordered by start time.
    pub placements: Vec<Placement>,
    /// In rank order.
    pub unplaced: Vec<UnplacedTask>,
    /// One entry per declared slot, in declaration order.
    pub slot_usage: Vec<SlotUsage>,
}

impl ScheduleResult {
    pub fn placement_for(&self, task_name: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.task.name == task_name)
    }

    pub fn is_unplaced(&self, task_name: &str) -> bool {
        self.unplaced.iter().any(|u| u.task.name == task_name)
    }

    /// Time spent outside nominal slot spans, summed over all placements.
    pub fn total_overflow(&self) -> Duration {
        let seconds = self.placements.iter().map(|p| p.overflow_seconds).sum();
        Duration::try_seconds(seconds).unwrap_or(Duration::MAX)
    }

    /// Sum of task minutes that made it into the schedule.
    pub fn placed_minutes(&self) -> i64 {
        self.placements.iter().map(|p| p.task.estimated_minutes).sum()
    }
}

/// A run over a slot set repeated for a number of periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSchedule {
    /// How many copies of the slot set the run used.
    pub periods: u32,
    #[serde(flatten)]
    pub result: ScheduleResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn task_serialization_defaults_optional_fields() {
        let task: Task =
            serde_json::from_str(r#"{"name":"write report","priority":3,"estimated_minutes":45}"#)
                .unwrap();
        assert_eq!(task.category, "");
        assert!(task.due_date.is_none());
        assert_eq!(task.estimated_duration(), Duration::minutes(45));
    }

    #[test]
    fn slot_flattens_interval_and_defaults_to_hard() {
        let slot: Slot = serde_json::from_str(
            r#"{"start":"2024-03-04T09:00:00Z","end":"2024-03-04T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(slot.boundary, BoundaryMode::Hard);
        assert_eq!(slot.interval.start, at(9, 0));

        let soft: Slot = serde_json::from_str(
            r#"{"start":"2024-03-04T09:00:00Z","end":"2024-03-04T10:00:00Z","boundary":"soft","tolerance_minutes":20}"#,
        )
        .unwrap();
        assert!(soft.is_soft());
        assert_eq!(soft.tolerance_minutes, Some(20));
    }

    #[test]
    fn unplaced_reason_serializes_snake_case() {
        let json = serde_json::to_string(&UnplacedReason::NoCapacity).unwrap();
        assert_eq!(json, "\"no_capacity\"");
        assert_eq!(UnplacedReason::NoCapacity.to_string(), "no_capacity");
    }

    #[test]
    fn estimated_duration_saturates_instead_of_panicking() {
        let task = Task::new("forever", 1, i64::MAX);
        assert_eq!(task.estimated_duration(), Duration::MAX);
    }

    #[test]
    fn result_totals_sum_over_placements() {
        let slot = Slot::soft(TimeInterval::new(at(9, 0), at(10, 0)).unwrap());
        let placement = |name: &str, start: u32, minutes: i64, overflow_seconds: i64| Placement {
            task: Task::new(name, 1, minutes),
            interval: TimeInterval::starting_at(at(start, 0), Duration::minutes(minutes)).unwrap(),
            slot_index: 0,
            slot: slot.clone(),
            overflow_seconds,
        };
        let result = ScheduleResult {
            placements: vec![placement("a", 9, 30, 0), placement("b", 9, 45, 900)],
            ..ScheduleResult::default()
        };
        assert_eq!(result.placed_minutes(), 75);
        assert_eq!(result.total_overflow(), Duration::minutes(15));
        assert_eq!(ScheduleResult::default().total_overflow(), Duration::zero());
    }
}
