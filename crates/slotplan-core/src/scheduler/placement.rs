//! Placement engine.
//!
//! Walks the ranked backlog once and commits each task to the first free
//! sub-interval that can hold it (first-fit over slots in declaration
//! order, then free intervals by start). When nothing fits inside any slot,
//! soft slots may lend part of their overflow budget. Committed placements
//! are never revisited.

use chrono::Duration;
use tracing::debug;

use crate::schedule::{Placement, Slot, Task, UnplacedReason, UnplacedTask};
use crate::timeline::{free_within, merge_intervals, TimeInterval};

use super::config::{OverflowSide, OverflowTieBreak, SchedulerConfig};
use super::normalize::{normalize_slots, SlotState};

/// A possible overflow placement in a soft slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OverflowCandidate {
    slot: usize,
    interval: TimeInterval,
    overflow: Duration,
    /// 0 when the candidate spills over the preferred edge.
    side_rank: u8,
}

/// Everything the engine produced, in commit order.
#[derive(Debug)]
pub struct PlacementOutcome {
    pub placements: Vec<Placement>,
    pub unplaced: Vec<UnplacedTask>,
    pub slots: Vec<SlotState>,
}

/// Greedy first-fit placement over per-slot free time.
pub struct PlacementEngine<'c> {
    config: &'c SchedulerConfig,
    /// Merged busy intervals.
    busy: Vec<TimeInterval>,
    slots: Vec<SlotState>,
    placements: Vec<Placement>,
    unplaced: Vec<UnplacedTask>,
}

impl<'c> PlacementEngine<'c> {
    /// Set up working state for a run. `busy` need not be merged.
    pub fn new(slots: &[Slot], busy: &[TimeInterval], config: &'c SchedulerConfig) -> Self {
        let busy = merge_intervals(busy);
        let slots = normalize_slots(slots, &busy, config);
        Self {
            config,
            busy,
            slots,
            placements: Vec::new(),
            unplaced: Vec::new(),
        }
    }

    pub fn slots(&self) -> &[SlotState] {
        &self.slots
    }

    /// Try to place one task. Returns the placement, or the reason it was
    /// left out (also recorded in the outcome).
    pub fn place(&mut self, task: &Task) -> Result<&Placement, UnplacedReason> {
        let length = task.estimated_duration();

        if let Some((slot, interval)) = self.find_in_bounds(length) {
            debug!(task = %task.name, slot, %interval, "placed inside slot");
            return Ok(self.commit(task, slot, interval, Duration::zero()));
        }

        if let Some(candidate) = self.find_overflow(length) {
            debug!(
                task = %task.name,
                slot = candidate.slot,
                interval = %candidate.interval,
                overflow_minutes = candidate.overflow.num_minutes(),
                "placed using soft overflow"
            );
            return Ok(self.commit(task, candidate.slot, candidate.interval, candidate.overflow));
        }

        debug!(task = %task.name, minutes = task.estimated_minutes, "no capacity");
        self.unplaced.push(UnplacedTask {
            task: task.clone(),
            reason: UnplacedReason::NoCapacity,
        });
        Err(UnplacedReason::NoCapacity)
    }

    pub fn finish(self) -> PlacementOutcome {
        PlacementOutcome {
            placements: self.placements,
            unplaced: self.unplaced,
            slots: self.slots,
        }
    }

    /// First free sub-interval long enough, scanning slots in declaration
    /// order and free intervals by start.
    fn find_in_bounds(&self, length: Duration) -> Option<(usize, TimeInterval)> {
        self.slots.iter().find_map(|state| {
            state.first_fit(length).and_then(|free| {
                TimeInterval::starting_at(free.start, length).map(|iv| (state.index(), iv))
            })
        })
    }

    /// Best overflow placement across soft slots, or `None`.
    fn find_overflow(&self, length: Duration) -> Option<OverflowCandidate> {
        let occupied = self.occupied();
        let mut candidates: Vec<OverflowCandidate> = self
            .slots
            .iter()
            .flat_map(|state| self.overflow_candidates(state, &occupied, length))
            .collect();

        match self.config.overflow_tie_break {
            OverflowTieBreak::LeastOverflow => candidates.sort_by_key(|c| {
                (c.overflow, c.slot, c.side_rank, c.interval.start)
            }),
            OverflowTieBreak::DeclarationOrder => candidates.sort_by_key(|c| {
                (c.slot, c.overflow, c.side_rank, c.interval.start)
            }),
        }
        candidates.into_iter().next()
    }

    /// Busy time plus everything placed so far, merged.
    fn occupied(&self) -> Vec<TimeInterval> {
        let mut all = self.busy.clone();
        all.extend(self.placements.iter().map(|p| p.interval));
        merge_intervals(&all)
    }

    /// Candidates in one soft slot.
    ///
    /// Each free segment of the extended window that reaches into the slot
    /// yields placements covering the slot-internal part of the segment
    /// entirely, which keeps overflow at `length - inside`.
    fn overflow_candidates(
        &self,
        state: &SlotState,
        occupied: &[TimeInterval],
        length: Duration,
    ) -> Vec<OverflowCandidate> {
        let Some(window) = state.extended() else {
            return Vec::new();
        };
        let nominal = *state.nominal();
        let budget = state.overflow_remaining();
        let mut out = Vec::new();

        for segment in free_within(&window, occupied) {
            if !segment.can_fit(length) || segment.intersection(&nominal).is_none() {
                continue;
            }

            let trailing_start = segment.start.max(nominal.start).min(segment.end - length);
            let leading_start = segment
                .end
                .min(nominal.end)
                .checked_sub_signed(length)
                .map_or(segment.start, |start| start.max(segment.start));

            for start in [trailing_start, leading_start] {
                let Some(interval) = TimeInterval::starting_at(start, length) else {
                    continue;
                };
                let overflow = interval.overhang(&nominal);
                if overflow > budget {
                    continue;
                }
                let candidate = OverflowCandidate {
                    slot: state.index(),
                    interval,
                    overflow,
                    side_rank: self.side_rank(&interval, &nominal),
                };
                if !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
        out
    }

    fn side_rank(&self, interval: &TimeInterval, nominal: &TimeInterval) -> u8 {
        let preferred = match self.config.overflow_side {
            OverflowSide::Trailing => interval.start >= nominal.start,
            OverflowSide::Leading => interval.end <= nominal.end,
        };
        if preferred {
            0
        } else {
            1
        }
    }

    fn commit(
        &mut self,
        task: &Task,
        slot: usize,
        interval: TimeInterval,
        overflow: Duration,
    ) -> &Placement {
        for state in &mut self.slots {
            state.reserve(&interval);
        }
        self.slots[slot].record_placement(overflow);

        self.placements.push(Placement {
            task: task.clone(),
            interval,
            slot_index: slot,
            slot: self.slots[slot].slot().clone(),
            overflow_seconds: overflow.num_seconds(),
        });
        &self.placements[self.placements.len() - 1]
    }
}
