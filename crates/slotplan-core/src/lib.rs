//! # Slotplan Core Library
//!
//! This library places a backlog of tasks into a user's declared availability
//! slots, around the events already on the calendar. It follows a CLI-first
//! philosophy: the `slotplan` binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timeline**: Half-open time intervals, busy-time merging and free-time
//!   computation
//! - **Scheduler**: Slot normalization, task ranking, greedy placement with
//!   soft-slot overflow, and schedule assembly with a final invariant check
//! - **Storage**: TOML-based configuration
//! - **Calendar**: Reader/writer boundary and the filter that turns calendar
//!   events into busy time
//! - **Capacity**: Backlog versus free-time estimate and slot repetition
//!   over consecutive periods
//!
//! ## Key Components
//!
//! - [`SlotScheduler`]: Entry point for a scheduling run
//! - [`ScheduleResult`]: Placements, unplaced tasks and per-slot usage
//! - [`Config`]: Application configuration management
//! - [`CalendarReader`] / [`CalendarWriter`]: Traits for calendar backends

pub mod calendar;
pub mod capacity;
pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod timeline;

pub use calendar::{
    write_schedule, CalendarEvent, CalendarReader, CalendarWriter, EventFilter, MemoryCalendar,
};
pub use capacity::{estimate, repeat_slots, CapacityReport};
pub use error::{ConfigError, CoreError, IntervalSource, Result, ScheduleError};
pub use schedule::{
    BoundaryMode, BusyInterval, PeriodSchedule, Placement, ScheduleResult, Slot, SlotUsage, Task,
    UnplacedReason, UnplacedTask, MAX_DURATION_MINUTES,
};
pub use scheduler::{
    schedule, OverflowSide, OverflowTieBreak, PriorityWeight, SchedulerConfig, SlotScheduler,
    ToleranceRule,
};
pub use storage::{CalendarConfig, Config};
pub use timeline::TimeInterval;
