//! Wire types shared by push and pull.

use serde::{Deserialize, Serialize};

use crate::models::{
    DailyNote, FuelLog, LocationLog, MileageEntry, RecordId, SavedLocation, TimeEntry,
    UserProfile, Vehicle,
};

/// The settings key/value map carried alongside the collections.
///
/// The client reads and writes the `customTags` and `pinnedNoteIds` keys;
/// any other keys a different client stored flow through `extra` untouched.
/// Absent keys stay `None` so a pull can distinguish "server has no value"
/// from "server has an empty list".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_note_ids: Option<Vec<RecordId>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The complete set of synchronized collections plus profile and settings
/// at a point in time. Sent whole on push; received whole on pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSnapshot {
    pub profile: Option<UserProfile>,
    pub time_entries: Vec<TimeEntry>,
    pub mileage_entries: Vec<MileageEntry>,
    pub fuel_logs: Vec<FuelLog>,
    pub daily_notes: Vec<DailyNote>,
    pub saved_locations: Vec<SavedLocation>,
    pub vehicles: Vec<Vehicle>,
    pub location_logs: Vec<LocationLog>,
    pub settings: SyncSettings,
}

/// `GET /sync` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct PullEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<SyncSnapshot>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /sync` and `POST /migrate` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AckEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_distinguish_absent_from_empty() {
        let absent: SyncSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.custom_tags, None);

        let empty: SyncSettings = serde_json::from_str(r#"{"customTags":[]}"#).unwrap();
        assert_eq!(empty.custom_tags, Some(vec![]));
    }

    #[test]
    fn test_settings_round_trip_unknown_keys() {
        let raw = r#"{"customTags":["a"],"dashboardLayout":{"cards":3}}"#;
        let settings: SyncSettings = serde_json::from_str(raw).unwrap();
        assert!(settings.extra.contains_key("dashboardLayout"));

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["dashboardLayout"]["cards"], 3);
    }

    #[test]
    fn test_snapshot_tolerates_missing_collections() {
        let snapshot: SyncSnapshot = serde_json::from_str(r#"{"timeEntries":[]}"#).unwrap();
        assert!(snapshot.profile.is_none());
        assert!(snapshot.fuel_logs.is_empty());
    }
}
