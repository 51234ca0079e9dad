//! Free-time computation.
//!
//! Busy intervals are coalesced first, then walked once against a window
//! to find the gaps left over.

use super::interval::TimeInterval;

/// Sort intervals by start and coalesce those that overlap or touch.
///
/// The result is ordered, pairwise disjoint and never adjacent.
pub fn merge_intervals(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut sorted: Vec<TimeInterval> = intervals.to_vec();
    sorted.sort_by_key(|i| (i.start, i.end));

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                if interval.end > last.end {
                    last.end = interval.end;
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Find the parts of `window` not covered by `busy`.
///
/// `busy` must already be merged (see [`merge_intervals`]). The returned
/// gaps are sorted by start time; a busy interval that covers the whole
/// window yields an empty vector.
pub fn free_within(window: &TimeInterval, busy: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut gaps = Vec::new();
    let mut last_end = window.start;

    for event in busy {
        // Skip events that end before our current position
        if event.end <= last_end {
            continue;
        }

        // Skip events that start after window end
        if event.start >= window.end {
            break;
        }

        if event.start > last_end {
            if let Some(gap) = TimeInterval::new(last_end, event.start.min(window.end)) {
                gaps.push(gap);
            }
        }

        if event.end > last_end {
            last_end = event.end.min(window.end);
        }
    }

    if let Some(gap) = TimeInterval::new(last_end, window.end) {
        gaps.push(gap);
    }

    gaps
}

/// Convenience wrapper that merges `busy` before computing free time.
pub fn subtract_intervals(window: &TimeInterval, busy: &[TimeInterval]) -> Vec<TimeInterval> {
    free_within(window, &merge_intervals(busy))
}

/// Remove `taken` from an ordered list of disjoint free intervals in place.
///
/// Parts before and after `taken` survive as separate intervals.
pub fn carve(free: &mut Vec<TimeInterval>, taken: &TimeInterval) {
    if !free.iter().any(|f| f.overlaps(taken)) {
        return;
    }

    let mut rest = Vec::with_capacity(free.len() + 1);
    for interval in free.drain(..) {
        if !interval.overlaps(taken) {
            rest.push(interval);
            continue;
        }
        if let Some(before) = TimeInterval::new(interval.start, taken.start) {
            rest.push(before);
        }
        if let Some(after) = TimeInterval::new(taken.end, interval.end) {
            rest.push(after);
        }
    }
    *free = rest;
}
