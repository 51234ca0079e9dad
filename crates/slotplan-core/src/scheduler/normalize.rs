//! Slot normalization.
//!
//! Turns each declared slot into working state for one run: the free
//! sub-intervals left after busy time is removed, and for soft slots the
//! overflow budget and the extended virtual interval it allows.

use chrono::Duration;

use crate::schedule::{BoundaryMode, Slot};
use crate::timeline::{carve, free_within, TimeInterval};

use super::config::SchedulerConfig;

/// Working state of one slot during a run.
///
/// Owned by the placement engine; free time only ever shrinks and the
/// overflow budget is never replenished.
#[derive(Debug, Clone)]
pub struct SlotState {
    index: usize,
    slot: Slot,
    free: Vec<TimeInterval>,
    tolerance: Duration,
    overflow_used: Duration,
    placed: usize,
}

impl SlotState {
    /// Build the state of `slot` against already merged busy intervals.
    pub fn new(index: usize, slot: &Slot, busy: &[TimeInterval], config: &SchedulerConfig) -> Self {
        Self {
            index,
            slot: slot.clone(),
            free: free_within(&slot.interval, busy),
            tolerance: config.tolerance_for(slot),
            overflow_used: Duration::zero(),
            placed: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.slot.boundary
    }

    pub fn nominal(&self) -> &TimeInterval {
        &self.slot.interval
    }

    /// Current free sub-intervals, ordered by start.
    pub fn free(&self) -> &[TimeInterval] {
        &self.free
    }

    pub fn free_duration(&self) -> Duration {
        self.free
            .iter()
            .fold(Duration::zero(), |acc, f| acc + f.duration())
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    pub fn overflow_used(&self) -> Duration {
        self.overflow_used
    }

    /// Overflow still available to this slot.
    pub fn overflow_remaining(&self) -> Duration {
        (self.tolerance - self.overflow_used).max(Duration::zero())
    }

    pub fn placed(&self) -> usize {
        self.placed
    }

    /// The slot span grown by the remaining overflow budget on both sides.
    ///
    /// `None` for hard slots and for soft slots whose budget is spent.
    /// This is virtual capacity only; it is never reported as free time.
    pub fn extended(&self) -> Option<TimeInterval> {
        let budget = self.overflow_remaining();
        if self.slot.boundary != BoundaryMode::Soft || budget <= Duration::zero() {
            return None;
        }
        Some(self.slot.interval.extend(budget, budget))
    }

    /// First free sub-interval that can hold `length`.
    pub fn first_fit(&self, length: Duration) -> Option<TimeInterval> {
        self.free.iter().copied().find(|f| f.can_fit(length))
    }

    /// Remove time taken by any placement, in this slot or another one.
    pub fn reserve(&mut self, taken: &TimeInterval) {
        carve(&mut self.free, taken);
    }

    /// Account a placement made in this slot.
    pub(crate) fn record_placement(&mut self, overflow: Duration) {
        self.placed += 1;
        self.overflow_used = self.overflow_used + overflow;
    }
}

/// Normalize all declared slots, preserving declaration order.
///
/// `busy` must be merged (see [`crate::timeline::merge_intervals`]).
pub fn normalize_slots(
    slots: &[Slot],
    busy: &[TimeInterval],
    config: &SchedulerConfig,
) -> Vec<SlotState> {
    slots
        .iter()
        .enumerate()
        .map(|(index, slot)| SlotState::new(index, slot, busy, config))
        .collect()
}
