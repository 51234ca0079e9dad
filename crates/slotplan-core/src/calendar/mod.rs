//! Calendar boundary.
//!
//! The engine never talks to a calendar service. Readers supply busy
//! intervals, writers receive finished placements. [`EventFilter`] turns raw
//! calendar events into busy intervals, skipping events slotplan wrote
//! itself so a re-run does not treat its own earlier output as fixed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, IntervalSource, Result, ScheduleError};
use crate::schedule::{BusyInterval, Placement, ScheduleResult};
use crate::storage::CalendarConfig;
use crate::timeline::TimeInterval;

/// A raw event as read from a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Calendar color; events slotplan created carry an application color.
    #[serde(default)]
    pub color_id: Option<String>,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            start,
            end,
            color_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_color(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }
}

/// Converts calendar events into busy intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    application_colors: Vec<String>,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::from_config(&CalendarConfig::default())
    }
}

impl EventFilter {
    pub fn new(application_colors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            application_colors: application_colors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.application_colors.iter().cloned())
    }

    /// The color stamped on events written by slotplan, if any is configured.
    pub fn application_color(&self) -> Option<&str> {
        self.application_colors.first().map(String::as_str)
    }

    /// True when the event was created by slotplan.
    pub fn is_application_event(&self, event: &CalendarEvent) -> bool {
        event
            .color_id
            .as_deref()
            .is_some_and(|c| self.application_colors.iter().any(|a| a == c))
    }

    /// Busy intervals for every user-owned event, in input order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterval` for the first event whose start is not
    /// before its end, including events that would have been skipped.
    pub fn busy_intervals(&self, events: &[CalendarEvent]) -> Result<Vec<BusyInterval>> {
        let mut busy = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            let interval = TimeInterval::new(event.start, event.end).ok_or(
                ScheduleError::InvalidInterval {
                    what: IntervalSource::Event,
                    index,
                    start: event.start,
                    end: event.end,
                },
            )?;
            if self.is_application_event(event) {
                debug!(event = %event.title, %interval, "skipping slotplan event");
                continue;
            }
            let label = if event.title.is_empty() {
                None
            } else {
                Some(event.title.clone())
            };
            busy.push(BusyInterval {
                label,
                interval,
            });
        }
        Ok(busy)
    }
}

/// Source of busy time.
pub trait CalendarReader {
    /// Busy intervals overlapping `horizon`. Implementations return only
    /// well-formed intervals.
    fn busy_intervals(&self, horizon: &TimeInterval) -> Result<Vec<BusyInterval>>;
}

/// Sink for finished placements.
pub trait CalendarWriter {
    fn write_placement(&mut self, placement: &Placement) -> Result<()>;
}

/// Write every placement of `result` in order.
///
/// Stops at the first failure and returns it; placements written before the
/// failure stay written. Returns the number of placements written.
///
/// # Errors
///
/// Returns the writer's error.
pub fn write_schedule<W: CalendarWriter + ?Sized>(
    writer: &mut W,
    result: &ScheduleResult,
) -> Result<usize> {
    for (written, placement) in result.placements.iter().enumerate() {
        writer.write_placement(placement).map_err(|e| {
            debug!(task = %placement.task.name, written, "calendar write failed");
            e
        })?;
    }
    Ok(result.placements.len())
}

/// Calendar kept in memory.
///
/// Placements written to it come back as events carrying the application
/// color, so reading it again skips them.
#[derive(Debug, Clone, Default)]
pub struct MemoryCalendar {
    events: Vec<CalendarEvent>,
    filter: EventFilter,
}

impl MemoryCalendar {
    pub fn new(filter: EventFilter) -> Self {
        Self {
            events: Vec::new(),
            filter,
        }
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = CalendarEvent>) -> Self {
        self.events.extend(events);
        self
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }
}

impl CalendarReader for MemoryCalendar {
    fn busy_intervals(&self, horizon: &TimeInterval) -> Result<Vec<BusyInterval>> {
        let in_horizon: Vec<CalendarEvent> = self
            .events
            .iter()
            .filter(|e| e.start < horizon.end && horizon.start < e.end)
            .cloned()
            .collect();
        self.filter.busy_intervals(&in_horizon)
    }
}

impl CalendarWriter for MemoryCalendar {
    fn write_placement(&mut self, placement: &Placement) -> Result<()> {
        let color = self.filter.application_color().ok_or_else(|| {
            CoreError::Calendar("no application color configured for written events".into())
        })?;
        let event = CalendarEvent::new(
            placement.task.name.clone(),
            placement.interval.start,
            placement.interval.end,
        )
        .with_id(format!("slotplan-{}", self.events.len()))
        .with_color(color);
        self.events.push(event);
        Ok(())
    }
}
