//! Interval arithmetic.
//!
//! This module provides:
//! - The half-open [`TimeInterval`] used for slots, busy events and placements
//! - Merging of busy intervals and free-time computation inside a window

mod gap;
mod interval;

pub use gap::{carve, free_within, merge_intervals, subtract_intervals};
pub use interval::TimeInterval;
