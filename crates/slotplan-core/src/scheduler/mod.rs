//! Task-to-slot scheduler.
//!
//! This module turns a task backlog into concrete calendar placements:
//! - Validates tasks, slots and busy intervals up front
//! - Computes each slot's free time around busy intervals
//! - Ranks tasks by priority weight per minute
//! - Places tasks greedily, first-fit, with soft-slot overflow as fallback
//! - Assembles and verifies the final [`ScheduleResult`]
//!
//! A run is a pure function of its inputs: no I/O, no state kept between
//! calls, and identical inputs always give identical results.

mod assemble;
mod config;
mod normalize;
mod placement;
mod ranking;

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, info};

use crate::capacity::{estimate, repeat_slots};
use crate::error::{CoreError, IntervalSource, Result, ScheduleError};
use crate::schedule::{
    BusyInterval, PeriodSchedule, ScheduleResult, Slot, Task, MAX_DURATION_MINUTES,
};
use crate::timeline::TimeInterval;

pub use assemble::{assemble, check_invariants};
pub use config::{OverflowSide, OverflowTieBreak, PriorityWeight, SchedulerConfig, ToleranceRule};
pub use normalize::{normalize_slots, SlotState};
pub use placement::{PlacementEngine, PlacementOutcome};
pub use ranking::{rank_tasks, RankedTask, TaskRanker};

/// Scheduler bound to one configuration.
///
/// Holds no run state, so one instance can serve any number of runs,
/// from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct SlotScheduler {
    config: SchedulerConfig,
}

impl SlotScheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Place `tasks` into `slots` around `busy`.
    ///
    /// # Errors
    ///
    /// - `Config` if the configuration is invalid
    /// - `Schedule(InvalidInterval)` for any slot or busy interval with
    ///   `start >= end`
    /// - `Schedule(InvalidSlot)` for a slot tolerance out of range
    /// - `Schedule(InvalidTask | DuplicateTask)` for malformed backlogs
    /// - `Schedule(InternalInvariant)` if the assembled result fails its own
    ///   consistency check
    ///
    /// Tasks that do not fit are not errors; they are listed in
    /// [`ScheduleResult::unplaced`].
    pub fn schedule(
        &self,
        tasks: &[Task],
        slots: &[Slot],
        busy: &[BusyInterval],
    ) -> Result<ScheduleResult> {
        self.config.validate()?;
        validate_input(tasks, slots, busy)?;

        let busy: Vec<TimeInterval> = busy.iter().map(|b| b.interval).collect();
        let ranked = TaskRanker::new(&self.config).rank(tasks);

        let mut engine = PlacementEngine::new(slots, &busy, &self.config);
        for entry in &ranked {
            debug!(task = %entry.task.name, score = entry.score, "placing");
            // Unplaced tasks are collected by the engine.
            let _ = engine.place(entry.task);
        }

        let result = assemble(engine.finish(), &busy).map_err(CoreError::from)?;
        info!(
            tasks = tasks.len(),
            slots = slots.len(),
            placed = result.placements.len(),
            placed_minutes = result.placed_minutes(),
            overflow_minutes = result.total_overflow().num_minutes(),
            unplaced = result.unplaced.len(),
            "schedule assembled"
        );
        Ok(result)
    }

    /// Schedule over `count` consecutive periods of `slots`.
    ///
    /// Busy intervals are absolute and apply to every period.
    pub fn schedule_periods(
        &self,
        tasks: &[Task],
        slots: &[Slot],
        busy: &[BusyInterval],
        period: Duration,
        count: u32,
    ) -> Result<PeriodSchedule> {
        let repeated = repeat_slots(slots, period, count)?;
        let result = self.schedule(tasks, &repeated, busy)?;
        Ok(PeriodSchedule {
            periods: count,
            result,
        })
    }

    /// Add periods of `slots` until every task is placed.
    ///
    /// Starts from the capacity estimate for one period and grows one period
    /// at a time. Stops at `max_periods` and returns that attempt, unplaced
    /// tasks included.
    pub fn schedule_until_fits(
        &self,
        tasks: &[Task],
        slots: &[Slot],
        busy: &[BusyInterval],
        period: Duration,
        max_periods: u32,
    ) -> Result<PeriodSchedule> {
        if max_periods == 0 {
            let err = ScheduleError::InvalidPeriod("period limit must be at least 1".into());
            return Err(err.into());
        }
        let report = estimate(tasks, slots, busy)?;
        let mut periods = report.periods_needed.unwrap_or(1).clamp(1, max_periods);

        loop {
            let attempt = self.schedule_periods(tasks, slots, busy, period, periods)?;
            if attempt.result.unplaced.is_empty() || periods >= max_periods {
                return Ok(attempt);
            }
            debug!(periods, unplaced = attempt.result.unplaced.len(), "adding a period");
            periods += 1;
        }
    }
}

/// Schedule with an explicit configuration.
///
/// Convenience wrapper over [`SlotScheduler::schedule`].
pub fn schedule(
    tasks: &[Task],
    slots: &[Slot],
    busy: &[BusyInterval],
    config: &SchedulerConfig,
) -> Result<ScheduleResult> {
    SlotScheduler::with_config(config.clone()).schedule(tasks, slots, busy)
}

/// Reject inputs the engine cannot reason about, before any work is done.
pub fn validate_input(
    tasks: &[Task],
    slots: &[Slot],
    busy: &[BusyInterval],
) -> std::result::Result<(), ScheduleError> {
    for (index, slot) in slots.iter().enumerate() {
        check_interval(IntervalSource::Slot, index, &slot.interval)?;
        if let Some(minutes) = slot.tolerance_minutes {
            if !(0..=MAX_DURATION_MINUTES).contains(&minutes) {
                return Err(ScheduleError::InvalidSlot {
                    index,
                    message: format!(
                        "tolerance must be between 0 and {MAX_DURATION_MINUTES} minutes, \
                         got {minutes}"
                    ),
                });
            }
        }
    }
    for (index, b) in busy.iter().enumerate() {
        check_interval(IntervalSource::Busy, index, &b.interval)?;
    }

    let mut names = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if task.name.trim().is_empty() {
            return Err(ScheduleError::InvalidTask {
                name: task.name.clone(),
                message: "name must not be empty".into(),
            });
        }
        if !(1..=MAX_DURATION_MINUTES).contains(&task.estimated_minutes) {
            return Err(ScheduleError::InvalidTask {
                name: task.name.clone(),
                message: format!(
                    "estimated duration must be between 1 and {MAX_DURATION_MINUTES} minutes, \
                     got {}",
                    task.estimated_minutes
                ),
            });
        }
        if !names.insert(task.name.as_str()) {
            return Err(ScheduleError::DuplicateTask(task.name.clone()));
        }
    }
    Ok(())
}

fn check_interval(
    what: IntervalSource,
    index: usize,
    interval: &TimeInterval,
) -> std::result::Result<(), ScheduleError> {
    if interval.is_well_formed() {
        Ok(())
    } else {
        Err(ScheduleError::InvalidInterval {
            what,
            index,
            start: interval.start,
            end: interval.end,
        })
    }
}
