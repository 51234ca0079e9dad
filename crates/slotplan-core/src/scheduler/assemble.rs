//! Schedule assembly and the final invariant check.
//!
//! A failed check means the engine produced something it promised never
//! to produce. It is reported as [`ScheduleError::InternalInvariant`] and is
//! never folded into ordinary per-task outcomes.

use chrono::Duration;
use tracing::error;

use crate::error::ScheduleError;
use crate::schedule::{BoundaryMode, Placement, ScheduleResult, SlotUsage};
use crate::timeline::{merge_intervals, TimeInterval};

use super::normalize::SlotState;
use super::placement::PlacementOutcome;

/// Build the result of a run and verify it against the busy intervals.
pub fn assemble(
    outcome: PlacementOutcome,
    busy: &[TimeInterval],
) -> Result<ScheduleResult, ScheduleError> {
    let PlacementOutcome {
        mut placements,
        unplaced,
        slots,
    } = outcome;

    placements.sort_by_key(|p| (p.interval.start, p.slot_index));
    let slot_usage = slots.iter().map(usage_of).collect();

    let result = ScheduleResult {
        placements,
        unplaced,
        slot_usage,
    };

    if let Err(violation) = check_invariants(&result, busy) {
        error!(%violation, "assembled schedule violates its invariants");
        return Err(ScheduleError::InternalInvariant(violation));
    }
    Ok(result)
}

fn usage_of(state: &SlotState) -> SlotUsage {
    let free_left = state
        .free()
        .iter()
        .filter_map(|f| f.intersection(state.nominal()))
        .fold(Duration::zero(), |acc, f| acc + f.duration());

    SlotUsage {
        slot_index: state.index(),
        boundary: state.boundary(),
        tolerance_seconds: state.tolerance().num_seconds(),
        overflow_used_seconds: state.overflow_used().num_seconds(),
        placed: state.placed(),
        free_seconds_left: free_left.num_seconds(),
    }
}

/// Check a result for overlaps, busy conflicts, truncated tasks and
/// overspent overflow budgets. `result.placements` must be sorted by start.
///
/// Returns a description of the first violation found.
pub fn check_invariants(result: &ScheduleResult, busy: &[TimeInterval]) -> Result<(), String> {
    for p in &result.placements {
        check_placement_shape(p)?;
    }

    // Sorted by start: any overlap shows up between a placement and the
    // furthest-reaching one before it.
    let mut reach: Option<&Placement> = None;
    for p in &result.placements {
        if let Some(prev) = reach {
            if prev.interval.overlaps(&p.interval) {
                return Err(format!(
                    "placements '{}' {} and '{}' {} overlap",
                    prev.task.name, prev.interval, p.task.name, p.interval
                ));
            }
        }
        if reach.map_or(true, |r| p.interval.end > r.interval.end) {
            reach = Some(p);
        }
    }

    let busy = merge_intervals(busy);
    for p in &result.placements {
        if let Some(b) = busy.iter().find(|b| b.overlaps(&p.interval)) {
            return Err(format!(
                "placement '{}' {} overlaps busy interval {}",
                p.task.name, p.interval, b
            ));
        }
    }

    for usage in &result.slot_usage {
        let spent: i64 = result
            .placements
            .iter()
            .filter(|p| p.slot_index == usage.slot_index)
            .map(|p| p.overflow_seconds)
            .sum();
        if spent != usage.overflow_used_seconds || spent > usage.tolerance_seconds {
            return Err(format!(
                "slot #{} used {}s of overflow against a tolerance of {}s",
                usage.slot_index, spent, usage.tolerance_seconds
            ));
        }
    }

    Ok(())
}

fn check_placement_shape(p: &Placement) -> Result<(), String> {
    if p.interval.duration() != p.task.estimated_duration() {
        return Err(format!(
            "placement '{}' lasts {}m, task needs {}m",
            p.task.name,
            p.interval.duration_minutes(),
            p.task.estimated_minutes
        ));
    }

    let overhang = p.interval.overhang(&p.slot.interval);
    if overhang.num_seconds() != p.overflow_seconds {
        return Err(format!(
            "placement '{}' records {}s of overflow but sticks out {}s",
            p.task.name,
            p.overflow_seconds,
            overhang.num_seconds()
        ));
    }
    if p.slot.boundary == BoundaryMode::Hard && overhang > Duration::zero() {
        return Err(format!(
            "placement '{}' {} leaves hard slot {}",
            p.task.name, p.interval, p.slot.interval
        ));
    }
    if p.interval.intersection(&p.slot.interval).is_none() {
        return Err(format!(
            "placement '{}' {} does not touch its slot {}",
            p.task.name, p.interval, p.slot.interval
        ));
    }
    Ok(())
}
