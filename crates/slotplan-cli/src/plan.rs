//! Plan files read by the `schedule` and `capacity` commands.
//!
//! A plan is a JSON document:
//!
//! ```json
//! {
//!   "tasks": [{ "name": "write", "priority": 3, "estimated_minutes": 30 }],
//!   "slots": [{ "start": "2024-03-04T09:00:00Z", "end": "2024-03-04T10:00:00Z", "boundary": "soft" }],
//!   "busy":  [{ "start": "2024-03-04T09:15:00Z", "end": "2024-03-04T09:45:00Z" }],
//!   "events": [{ "title": "standup", "start": "...", "end": "...", "color_id": "9" }]
//! }
//! ```
//!
//! `busy` and `events` are optional. Events go through the calendar filter
//! first, so events slotplan wrote earlier are ignored.

use std::path::Path;

use serde::Deserialize;
use slotplan_core::{BusyInterval, CalendarEvent, EventFilter, Slot, Task};

#[derive(Debug, Deserialize)]
pub struct PlanFile {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub busy: Vec<BusyInterval>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl PlanFile {
    pub fn read(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read plan file {}: {e}", path.display()))?;
        let plan = serde_json::from_str(&content)
            .map_err(|e| format!("invalid plan file {}: {e}", path.display()))?;
        Ok(plan)
    }

    /// Explicit busy intervals followed by those derived from events.
    pub fn busy_intervals(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<BusyInterval>, Box<dyn std::error::Error>> {
        let mut busy = self.busy.clone();
        busy.extend(filter.busy_intervals(&self.events)?);
        Ok(busy)
    }
}
