//! Location, vehicle, and geo-pin models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;

/// A reusable place (job site, office, supplier) for quick selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLocation {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub usage_count: u32,
    pub last_used: String,
}

/// A vehicle the user drives; at most one is marked default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: RecordId,
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: String,
    pub is_default: bool,
}

/// Partial update for a [`Vehicle`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehiclePatch {
    pub name: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub is_default: Option<bool>,
}

impl Vehicle {
    /// Merge a partial update into this vehicle.
    pub fn apply(&mut self, patch: VehiclePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(make) = patch.make {
            self.make = make;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(license_plate) = patch.license_plate {
            self.license_plate = license_plate;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
    }
}

/// Weather captured alongside a geo pin; local display only, never synced
/// as dedicated columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogWeather {
    pub temp: f64,
    pub condition: String,
    pub icon: String,
}

/// A geo pin recorded while a shift is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationLog {
    pub id: RecordId,
    pub shift_id: Option<RecordId>,
    pub lat: f64,
    pub lng: f64,
    pub place_name: String,
    pub place_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<LogWeather>,
}
