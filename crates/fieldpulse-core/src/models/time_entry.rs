//! Time entry model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;

/// A finalized (or still-open) work shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    /// Unique identifier
    pub id: RecordId,
    /// Shift start instant
    pub start_time: DateTime<Utc>,
    /// Shift end instant; `None` while the shift is still open
    pub end_time: Option<DateTime<Utc>>,
    /// Unpaid break minutes subtracted from worked hours
    pub break_minutes: u32,
    pub notes: String,
    pub tags: Vec<String>,
    /// Calendar day the entry belongs to
    pub date: NaiveDate,
    /// Whether worked hours exceeded the overtime threshold at finalize time
    pub is_overtime: bool,
    /// Hourly rate snapshot taken when the entry was created
    pub hourly_rate: Option<f64>,
}

impl TimeEntry {
    /// Worked hours: elapsed time minus breaks, clamped at zero.
    ///
    /// An entry without an end time counts as zero hours.
    #[must_use]
    pub fn worked_hours(&self) -> f64 {
        let Some(end) = self.end_time else {
            return 0.0;
        };
        #[allow(clippy::cast_precision_loss)]
        let elapsed = (end - self.start_time).num_milliseconds() as f64 / 3_600_000.0;
        (elapsed - f64::from(self.break_minutes) / 60.0).max(0.0)
    }
}

/// Partial update for a [`TimeEntry`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeEntryPatch {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub break_minutes: Option<u32>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub date: Option<NaiveDate>,
    pub is_overtime: Option<bool>,
    pub hourly_rate: Option<f64>,
}

impl TimeEntry {
    /// Merge a partial update into this entry.
    pub fn apply(&mut self, patch: TimeEntryPatch) {
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = Some(end_time);
        }
        if let Some(break_minutes) = patch.break_minutes {
            self.break_minutes = break_minutes;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(is_overtime) = patch.is_overtime {
            self.is_overtime = is_overtime;
        }
        if let Some(hourly_rate) = patch.hourly_rate {
            self.hourly_rate = Some(hourly_rate);
        }
    }
}
