//! Mileage entry model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecordId;

/// Why a trip was driven; work trips count toward reimbursement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripPurpose {
    #[default]
    Work,
    Personal,
    Commute,
}

/// One logged trip, odometer-based.
///
/// Invariant: `end_mileage >= start_mileage` when the end value is present;
/// `trip_miles` is computed at write time, not re-derived on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageEntry {
    pub id: RecordId,
    pub date: NaiveDate,
    pub start_mileage: f64,
    /// `None` while the trip is still open
    pub end_mileage: Option<f64>,
    pub trip_miles: f64,
    pub start_location: String,
    pub end_location: String,
    pub notes: String,
    /// Optional link to the shift this trip belongs to
    pub linked_time_entry_id: Option<RecordId>,
    pub purpose: TripPurpose,
}

/// Partial update for a [`MileageEntry`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MileageEntryPatch {
    pub date: Option<NaiveDate>,
    pub start_mileage: Option<f64>,
    pub end_mileage: Option<f64>,
    pub trip_miles: Option<f64>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub notes: Option<String>,
    pub linked_time_entry_id: Option<RecordId>,
    pub purpose: Option<TripPurpose>,
}

impl MileageEntry {
    /// Merge a partial update into this entry.
    pub fn apply(&mut self, patch: MileageEntryPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(start_mileage) = patch.start_mileage {
            self.start_mileage = start_mileage;
        }
        if let Some(end_mileage) = patch.end_mileage {
            self.end_mileage = Some(end_mileage);
        }
        if let Some(trip_miles) = patch.trip_miles {
            self.trip_miles = trip_miles;
        }
        if let Some(start_location) = patch.start_location {
            self.start_location = start_location;
        }
        if let Some(end_location) = patch.end_location {
            self.end_location = end_location;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(linked) = patch.linked_time_entry_id {
            self.linked_time_entry_id = Some(linked);
        }
        if let Some(purpose) = patch.purpose {
            self.purpose = purpose;
        }
    }
}
