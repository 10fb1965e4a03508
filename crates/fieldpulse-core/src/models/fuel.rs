//! Fuel log model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecordId;

/// Fuel grade selected at the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    #[default]
    Regular,
    Mid,
    Premium,
    Diesel,
}

/// One fill-up.
///
/// `total_cost` is computed as `gallons * cost_per_gallon` when the log is
/// created and stored as-is afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelLog {
    pub id: RecordId,
    pub date: NaiveDate,
    /// Local wall-clock time of the fill-up, e.g. "14:05"
    pub time: String,
    /// Odometer reading at the pump
    pub mileage: f64,
    pub gallons: f64,
    pub cost_per_gallon: f64,
    pub total_cost: f64,
    pub station: String,
    pub notes: String,
    pub receipt_photo: Option<String>,
    pub fuel_type: FuelType,
}

/// Partial update for a [`FuelLog`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FuelLogPatch {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub mileage: Option<f64>,
    pub gallons: Option<f64>,
    pub cost_per_gallon: Option<f64>,
    pub total_cost: Option<f64>,
    pub station: Option<String>,
    pub notes: Option<String>,
    pub receipt_photo: Option<String>,
    pub fuel_type: Option<FuelType>,
}

impl FuelLog {
    /// Merge a partial update into this log.
    pub fn apply(&mut self, patch: FuelLogPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(mileage) = patch.mileage {
            self.mileage = mileage;
        }
        if let Some(gallons) = patch.gallons {
            self.gallons = gallons;
        }
        if let Some(cost_per_gallon) = patch.cost_per_gallon {
            self.cost_per_gallon = cost_per_gallon;
        }
        if let Some(total_cost) = patch.total_cost {
            self.total_cost = total_cost;
        }
        if let Some(station) = patch.station {
            self.station = station;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(receipt_photo) = patch.receipt_photo {
            self.receipt_photo = Some(receipt_photo);
        }
        if let Some(fuel_type) = patch.fuel_type {
            self.fuel_type = fuel_type;
        }
    }
}
