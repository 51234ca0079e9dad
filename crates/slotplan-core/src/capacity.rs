//! Backlog feasibility estimate.
//!
//! Compares the time a backlog needs with the time a set of slots offers,
//! before any placement is attempted. Useful to decide how many days (or
//! other repetitions of the slot set) to plan for.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::schedule::{BusyInterval, Slot, Task};
use crate::scheduler::validate_input;
use crate::timeline::{free_within, merge_intervals, TimeInterval};

/// Required versus available time for one backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReport {
    /// Sum of all task durations.
    pub required_minutes: i64,
    /// Sum of nominal slot lengths, ignoring busy time.
    pub slot_minutes: i64,
    /// Slot time left once busy intervals are removed.
    pub free_minutes: i64,
    /// Repetitions of the slot set needed to cover the backlog.
    /// `None` when there is work but no free time at all.
    pub periods_needed: Option<u32>,
}

impl CapacityReport {
    /// True when one pass over the slots has at least as much free time as
    /// the backlog needs. Fragmentation may still leave tasks unplaced.
    pub fn fits_once(&self) -> bool {
        self.required_minutes <= self.free_minutes
    }
}

/// Estimate whether `tasks` fit in `slots` around `busy`.
///
/// Slots that overlap each other are counted once for the overlapping part.
/// Soft-slot tolerance is not counted as capacity.
///
/// # Errors
///
/// Rejects the same inputs a scheduling run would reject, so a report is
/// never computed from intervals the scheduler refuses.
pub fn estimate(
    tasks: &[Task],
    slots: &[Slot],
    busy: &[BusyInterval],
) -> Result<CapacityReport, ScheduleError> {
    validate_input(tasks, slots, busy)?;

    let required_minutes: i64 = tasks.iter().map(|t| t.estimated_minutes).sum();

    let spans: Vec<TimeInterval> = slots.iter().map(|s| s.interval).collect();
    let spans = merge_intervals(&spans);
    let busy: Vec<TimeInterval> = busy.iter().map(|b| b.interval).collect();
    let busy = merge_intervals(&busy);

    let slot_time = spans
        .iter()
        .fold(Duration::zero(), |acc, s| acc + s.duration());
    let free_time = spans
        .iter()
        .flat_map(|s| free_within(s, &busy))
        .fold(Duration::zero(), |acc, f| acc + f.duration());

    let free_minutes = free_time.num_minutes();
    Ok(CapacityReport {
        required_minutes,
        slot_minutes: slot_time.num_minutes(),
        free_minutes,
        periods_needed: periods_needed(required_minutes, free_minutes),
    })
}

/// Lay `slots` out over `count` consecutive periods.
///
/// Period `k` holds every slot shifted by `k * period`, and the output keeps
/// period order first, declaration order second. Labels, boundaries and
/// tolerances are copied unchanged.
///
/// # Errors
///
/// `InvalidPeriod` when `period` is not positive, `count` is zero, or a
/// shifted slot falls outside the representable time range.
pub fn repeat_slots(
    slots: &[Slot],
    period: Duration,
    count: u32,
) -> Result<Vec<Slot>, ScheduleError> {
    if period <= Duration::zero() {
        return Err(ScheduleError::InvalidPeriod(format!(
            "period length must be positive, got {period}"
        )));
    }
    if count == 0 {
        return Err(ScheduleError::InvalidPeriod("period count must be at least 1".into()));
    }

    let mut repeated = Vec::new();
    let mut offset = Duration::zero();
    for k in 0..count {
        if k > 0 {
            offset = offset.checked_add(&period).ok_or_else(|| out_of_range(k))?;
        }
        for slot in slots {
            let start = slot.interval.start.checked_add_signed(offset);
            let end = slot.interval.end.checked_add_signed(offset);
            let (Some(start), Some(end)) = (start, end) else {
                return Err(out_of_range(k));
            };
            repeated.push(Slot {
                interval: TimeInterval { start, end },
                ..slot.clone()
            });
        }
    }
    Ok(repeated)
}

fn out_of_range(k: u32) -> ScheduleError {
    ScheduleError::InvalidPeriod(format!("period {k} falls outside the supported time range"))
}

pub(crate) fn periods_needed(required: i64, free: i64) -> Option<u32> {
    if required <= 0 {
        return Some(1);
    }
    if free <= 0 {
        return None;
    }
    let periods = (required + free - 1) / free;
    u32::try_from(periods.max(1)).ok()
}
