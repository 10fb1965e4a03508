//! The local working set: single source of truth for every front end.
//!
//! [`LocalStore`] is an explicitly constructed, cloneable handle around the
//! plain-data [`StoreState`]. Every mutating operation bumps a revision
//! counter on a watch channel so the sync engine can observe changes without
//! the store knowing anything about syncing.

mod persistence;

pub use persistence::{Persistence, STORAGE_FILE};

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::{
    DailyNote, DailyNotePatch, FuelLog, FuelLogPatch, LocationLog, MileageEntry,
    MileageEntryPatch, ProfilePatch, RecordId, SavedLocation, TimeEntry, TimeEntryPatch,
    TripPurpose, UserProfile, Vehicle, VehiclePatch, WeeklyGoalPatch,
};
use crate::sync::snapshot::{SyncSettings, SyncSnapshot};
use crate::util::today;

/// Tag list seeded into a fresh store.
const DEFAULT_TAGS: &[&str] = &[
    "CA", "FL", "TX", "NY", "Advance", "Travel", "Office", "Field", "Per Diem", "Jobsite",
    "Meeting",
];

/// Ephemeral shift-timer state.
///
/// Persisted with the rest of the store, so a running timer survives a
/// restart. Never synced as a half-formed entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TimerState {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Running { started_at: DateTime<Utc> },
}

impl TimerState {
    /// Whether a shift timer is currently running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// Ephemeral trip state. Only one trip may run at a time; starting a new
/// trip while one is active overwrites the prior start value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TripState {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Running { start_mileage: f64 },
}

impl TripState {
    /// Whether a trip is currently running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// The complete client-side state, serialized as one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreState {
    pub profile: UserProfile,
    pub timer: TimerState,
    pub trip: TripState,
    pub time_entries: Vec<TimeEntry>,
    pub mileage_entries: Vec<MileageEntry>,
    pub fuel_logs: Vec<FuelLog>,
    pub daily_notes: Vec<DailyNote>,
    pub saved_locations: Vec<SavedLocation>,
    pub vehicles: Vec<Vehicle>,
    pub active_vehicle_id: Option<RecordId>,
    pub location_logs: Vec<LocationLog>,
    pub custom_tags: Vec<String>,
    pub pinned_note_ids: Vec<RecordId>,
    pub streak_count: u32,
    pub last_log_date: Option<NaiveDate>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            profile: UserProfile::default(),
            timer: TimerState::Idle,
            trip: TripState::Idle,
            time_entries: Vec::new(),
            mileage_entries: Vec::new(),
            fuel_logs: Vec::new(),
            daily_notes: Vec::new(),
            saved_locations: Vec::new(),
            vehicles: Vec::new(),
            active_vehicle_id: None,
            location_logs: Vec::new(),
            custom_tags: DEFAULT_TAGS.iter().map(ToString::to_string).collect(),
            pinned_note_ids: Vec::new(),
            streak_count: 0,
            last_log_date: None,
        }
    }
}

impl StoreState {
    /// The push payload view: all synced collections plus profile and the
    /// settings key/value map.
    #[must_use]
    pub fn sync_snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            profile: Some(self.profile.clone()),
            time_entries: self.time_entries.clone(),
            mileage_entries: self.mileage_entries.clone(),
            fuel_logs: self.fuel_logs.clone(),
            daily_notes: self.daily_notes.clone(),
            saved_locations: self.saved_locations.clone(),
            vehicles: self.vehicles.clone(),
            location_logs: self.location_logs.clone(),
            settings: SyncSettings {
                custom_tags: Some(self.custom_tags.clone()),
                pinned_note_ids: Some(self.pinned_note_ids.clone()),
                extra: serde_json::Map::new(),
            },
        }
    }

    /// Bump the daily logging streak: same day is a no-op, a consecutive
    /// day increments, a gap resets to one.
    fn update_streak(&mut self, today: NaiveDate) {
        if self.last_log_date == Some(today) {
            return;
        }
        let yesterday = today.pred_opt();
        if self.last_log_date.is_some() && self.last_log_date == yesterday {
            self.streak_count += 1;
        } else {
            self.streak_count = 1;
        }
        self.last_log_date = Some(today);
    }
}

struct StoreInner {
    state: Mutex<StoreState>,
    revision: watch::Sender<u64>,
    persistence: Option<Persistence>,
}

/// Cloneable handle to the shared local store.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<StoreInner>,
}

impl LocalStore {
    /// Create an in-memory store with default state (no persistence).
    #[must_use]
    pub fn new() -> Self {
        Self::from_state(StoreState::default(), None)
    }

    /// Restore the store from disk, falling back to default state when no
    /// document exists yet. Every subsequent mutation is written back.
    #[must_use]
    pub fn load(persistence: Persistence) -> Self {
        let state = persistence.load();
        Self::from_state(state, Some(persistence))
    }

    fn from_state(state: StoreState, persistence: Option<Persistence>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                revision,
                persistence,
            }),
        }
    }

    /// Subscribe to the revision counter; every mutation bumps it.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Run a closure against the current state without mutating it.
    pub fn with_state<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        let state = self.inner.state.lock().expect("store lock poisoned");
        f(&state)
    }

    /// Clone the full current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.with_state(Clone::clone)
    }

    /// Build the current push payload.
    #[must_use]
    pub fn sync_snapshot(&self) -> SyncSnapshot {
        self.with_state(StoreState::sync_snapshot)
    }

    /// Mutate the state, bump the revision, and write through to disk.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let result = {
            let mut state = self.inner.state.lock().expect("store lock poisoned");
            let result = f(&mut state);
            if let Some(persistence) = &self.inner.persistence {
                if let Err(error) = persistence.save(&state) {
                    tracing::warn!(%error, "failed to persist local store");
                }
            }
            result
        };
        self.inner.revision.send_modify(|revision| *revision += 1);
        result
    }

    // --- Profile ---

    /// Merge a partial profile update.
    pub fn set_profile(&self, patch: ProfilePatch) {
        self.mutate(|state| state.profile.apply(patch));
    }

    /// Merge a partial weekly-goal update.
    pub fn set_weekly_goal(&self, patch: WeeklyGoalPatch) {
        self.mutate(|state| state.profile.weekly_goal.apply(patch));
    }

    // --- Shift timer ---

    /// Start the shift timer. Starting while running restarts the clock.
    pub fn start_timer(&self) {
        self.start_timer_at(Utc::now());
    }

    fn start_timer_at(&self, now: DateTime<Utc>) {
        self.mutate(|state| state.timer = TimerState::Running { started_at: now });
    }

    /// Stop the shift timer and finalize a [`TimeEntry`].
    ///
    /// Computes worked hours (elapsed minus breaks), compares them against
    /// the profile overtime threshold, and snapshots the hourly rate.
    /// Returns the new entry's id, or `None` if no timer was running.
    pub fn stop_timer(&self, break_minutes: u32) -> Option<RecordId> {
        self.stop_timer_at(Utc::now(), break_minutes)
    }

    fn stop_timer_at(&self, now: DateTime<Utc>, break_minutes: u32) -> Option<RecordId> {
        self.mutate(|state| {
            let TimerState::Running { started_at } = state.timer else {
                return None;
            };
            let mut entry = TimeEntry {
                id: RecordId::new(),
                start_time: started_at,
                end_time: Some(now),
                break_minutes,
                notes: String::new(),
                tags: Vec::new(),
                date: now.date_naive(),
                is_overtime: false,
                hourly_rate: (state.profile.hourly_rate > 0.0)
                    .then_some(state.profile.hourly_rate),
            };
            entry.is_overtime = entry.worked_hours() > state.profile.overtime_threshold;

            let id = entry.id.clone();
            state.time_entries.insert(0, entry);
            state.timer = TimerState::Idle;
            state.update_streak(now.date_naive());
            Some(id)
        })
    }

    // --- Trip ---

    /// Start a trip at the given odometer reading. Starting while a trip is
    /// running overwrites the prior start value.
    pub fn start_trip(&self, start_mileage: f64) {
        self.mutate(|state| state.trip = TripState::Running { start_mileage });
    }

    /// End the running trip and finalize a [`MileageEntry`] with
    /// `trip_miles = end - start`. Returns the new entry's id, or `None` if
    /// no trip was running.
    pub fn end_trip(&self, end_mileage: f64) -> Option<RecordId> {
        self.mutate(|state| {
            let TripState::Running { start_mileage } = state.trip else {
                return None;
            };
            let entry = MileageEntry {
                id: RecordId::new(),
                date: today(),
                start_mileage,
                end_mileage: Some(end_mileage),
                trip_miles: end_mileage - start_mileage,
                start_location: String::new(),
                end_location: String::new(),
                notes: String::new(),
                linked_time_entry_id: None,
                purpose: TripPurpose::Work,
            };
            let id = entry.id.clone();
            state.mileage_entries.insert(0, entry);
            state.trip = TripState::Idle;
            state.update_streak(today());
            Some(id)
        })
    }

    // --- Time entries ---

    /// Insert a new entry at the front under a fresh id; returns the id.
    pub fn add_time_entry(&self, mut entry: TimeEntry) -> RecordId {
        entry.id = RecordId::new();
        let id = entry.id.clone();
        self.mutate(|state| state.time_entries.insert(0, entry));
        id
    }

    /// Merge fields into the matching entry; silent no-op on unknown id.
    pub fn update_time_entry(&self, id: &RecordId, patch: TimeEntryPatch) {
        self.mutate(|state| {
            if let Some(entry) = state.time_entries.iter_mut().find(|e| &e.id == id) {
                entry.apply(patch);
            }
        });
    }

    /// Remove the matching entry; silent no-op on unknown id.
    pub fn delete_time_entry(&self, id: &RecordId) {
        self.mutate(|state| state.time_entries.retain(|e| &e.id != id));
    }

    // --- Mileage entries ---

    pub fn add_mileage_entry(&self, mut entry: MileageEntry) -> RecordId {
        entry.id = RecordId::new();
        let id = entry.id.clone();
        self.mutate(|state| state.mileage_entries.insert(0, entry));
        id
    }

    pub fn update_mileage_entry(&self, id: &RecordId, patch: MileageEntryPatch) {
        self.mutate(|state| {
            if let Some(entry) = state.mileage_entries.iter_mut().find(|e| &e.id == id) {
                entry.apply(patch);
            }
        });
    }

    pub fn delete_mileage_entry(&self, id: &RecordId) {
        self.mutate(|state| state.mileage_entries.retain(|e| &e.id != id));
    }

    // --- Fuel logs ---

    pub fn add_fuel_log(&self, mut log: FuelLog) -> RecordId {
        log.id = RecordId::new();
        let id = log.id.clone();
        self.mutate(|state| state.fuel_logs.insert(0, log));
        id
    }

    pub fn update_fuel_log(&self, id: &RecordId, patch: FuelLogPatch) {
        self.mutate(|state| {
            if let Some(log) = state.fuel_logs.iter_mut().find(|l| &l.id == id) {
                log.apply(patch);
            }
        });
    }

    pub fn delete_fuel_log(&self, id: &RecordId) {
        self.mutate(|state| state.fuel_logs.retain(|l| &l.id != id));
    }

    // --- Daily notes ---

    pub fn add_daily_note(&self, mut note: DailyNote) -> RecordId {
        note.id = RecordId::new();
        let id = note.id.clone();
        self.mutate(|state| state.daily_notes.insert(0, note));
        id
    }

    pub fn update_daily_note(&self, id: &RecordId, patch: DailyNotePatch) {
        self.mutate(|state| {
            if let Some(note) = state.daily_notes.iter_mut().find(|n| &n.id == id) {
                note.apply(patch);
            }
        });
    }

    pub fn delete_daily_note(&self, id: &RecordId) {
        self.mutate(|state| state.daily_notes.retain(|n| &n.id != id));
    }

    /// Toggle a note's membership in the ordered pinned-id list.
    pub fn toggle_pin_note(&self, id: &RecordId) {
        self.mutate(|state| {
            if state.pinned_note_ids.contains(id) {
                state.pinned_note_ids.retain(|p| p != id);
            } else {
                state.pinned_note_ids.push(id.clone());
            }
        });
    }

    // --- Saved locations ---

    pub fn add_location(&self, mut location: SavedLocation) -> RecordId {
        location.id = RecordId::new();
        let id = location.id.clone();
        self.mutate(|state| state.saved_locations.insert(0, location));
        id
    }

    pub fn remove_location(&self, id: &RecordId) {
        self.mutate(|state| state.saved_locations.retain(|l| &l.id != id));
    }

    // --- Vehicles ---

    pub fn add_vehicle(&self, mut vehicle: Vehicle) -> RecordId {
        vehicle.id = RecordId::new();
        let id = vehicle.id.clone();
        self.mutate(|state| state.vehicles.insert(0, vehicle));
        id
    }

    pub fn update_vehicle(&self, id: &RecordId, patch: VehiclePatch) {
        self.mutate(|state| {
            if let Some(vehicle) = state.vehicles.iter_mut().find(|v| &v.id == id) {
                vehicle.apply(patch);
            }
        });
    }

    /// Remove a vehicle, clearing the active selection if it pointed at it.
    pub fn delete_vehicle(&self, id: &RecordId) {
        self.mutate(|state| {
            state.vehicles.retain(|v| &v.id != id);
            if state.active_vehicle_id.as_ref() == Some(id) {
                state.active_vehicle_id = None;
            }
        });
    }

    pub fn set_active_vehicle(&self, id: Option<RecordId>) {
        self.mutate(|state| state.active_vehicle_id = id);
    }

    // --- Location logs ---

    pub fn add_location_log(&self, mut log: LocationLog) -> RecordId {
        log.id = RecordId::new();
        let id = log.id.clone();
        self.mutate(|state| state.location_logs.insert(0, log));
        id
    }

    /// Drop every geo pin recorded for the given shift.
    pub fn clear_shift_locations(&self, shift_id: &RecordId) {
        self.mutate(|state| {
            state
                .location_logs
                .retain(|log| log.shift_id.as_ref() != Some(shift_id));
        });
    }

    // --- Custom tags ---

    /// Append a tag unless it is already present.
    pub fn add_tag(&self, tag: impl Into<String>) {
        let tag = tag.into();
        self.mutate(|state| {
            if !state.custom_tags.contains(&tag) {
                state.custom_tags.push(tag);
            }
        });
    }

    pub fn remove_tag(&self, tag: &str) {
        self.mutate(|state| state.custom_tags.retain(|t| t != tag));
    }

    /// Merge a remote snapshot into the store (pull reconciliation).
    pub fn apply_remote(&self, remote: SyncSnapshot) {
        self.mutate(|state| crate::sync::merge_remote(state, remote));
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn sample_fuel_log() -> FuelLog {
        FuelLog {
            id: RecordId::new(),
            date: today(),
            time: "08:30".to_string(),
            mileage: 48_210.0,
            gallons: 10.0,
            cost_per_gallon: 3.5,
            total_cost: 35.0,
            station: "Shell".to_string(),
            notes: String::new(),
            receipt_photo: None,
            fuel_type: crate::models::FuelType::Regular,
        }
    }

    #[test]
    fn test_stop_timer_finalizes_entry() {
        let store = LocalStore::new();
        store.set_profile(ProfilePatch {
            overtime_threshold: Some(8.0),
            hourly_rate: Some(25.0),
            ..ProfilePatch::default()
        });

        let start = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        store.start_timer_at(start);
        assert!(store.with_state(|s| s.timer.is_running()));

        let id = store
            .stop_timer_at(start + Duration::hours(2), 30)
            .expect("timer was running");

        let entry = store.with_state(|s| s.time_entries[0].clone());
        assert_eq!(entry.id, id);
        assert!((entry.worked_hours() - 1.5).abs() < 1e-9);
        assert!(!entry.is_overtime);
        assert_eq!(entry.hourly_rate, Some(25.0));
        assert!(store.with_state(|s| !s.timer.is_running()));
    }

    #[test]
    fn test_stop_timer_flags_overtime() {
        let store = LocalStore::new();
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 6, 0, 0).unwrap();
        store.start_timer_at(start);
        store
            .stop_timer_at(start + Duration::hours(10), 0)
            .expect("timer was running");
        assert!(store.with_state(|s| s.time_entries[0].is_overtime));
    }

    #[test]
    fn test_stop_idle_timer_is_noop() {
        let store = LocalStore::new();
        assert!(store.stop_timer(0).is_none());
        assert!(store.with_state(|s| s.time_entries.is_empty()));
    }

    #[test]
    fn test_trip_lifecycle() {
        let store = LocalStore::new();
        store.start_trip(100.0);
        // Restarting overwrites the prior start value.
        store.start_trip(120.0);
        let id = store.end_trip(170.0).expect("trip was running");

        let entry = store.with_state(|s| s.mileage_entries[0].clone());
        assert_eq!(entry.id, id);
        assert!((entry.trip_miles - 50.0).abs() < f64::EPSILON);
        assert_eq!(entry.purpose, TripPurpose::Work);
        assert!(store.with_state(|s| !s.trip.is_running()));
    }

    #[test]
    fn test_end_trip_without_start_is_noop() {
        let store = LocalStore::new();
        assert!(store.end_trip(50.0).is_none());
    }

    #[test]
    fn test_add_generates_fresh_id_and_prepends() {
        let store = LocalStore::new();
        let first = store.add_fuel_log(sample_fuel_log());
        let second = store.add_fuel_log(sample_fuel_log());
        assert_ne!(first, second);
        let order = store.with_state(|s| (s.fuel_logs[0].id.clone(), s.fuel_logs[1].id.clone()));
        assert_eq!(order, (second, first));
    }

    #[test]
    fn test_update_unknown_id_is_silent() {
        let store = LocalStore::new();
        store.update_fuel_log(
            &"missing".into(),
            FuelLogPatch {
                station: Some("BP".to_string()),
                ..FuelLogPatch::default()
            },
        );
        assert!(store.with_state(|s| s.fuel_logs.is_empty()));
    }

    #[test]
    fn test_delete_removes_matching_record() {
        let store = LocalStore::new();
        let id = store.add_fuel_log(sample_fuel_log());
        store.delete_fuel_log(&id);
        store.delete_fuel_log(&id); // second delete is a no-op
        assert!(store.with_state(|s| s.fuel_logs.is_empty()));
    }

    #[test]
    fn test_toggle_pin_note() {
        let store = LocalStore::new();
        let id: RecordId = "n1".into();
        store.toggle_pin_note(&id);
        assert!(store.with_state(|s| s.pinned_note_ids.contains(&id)));
        store.toggle_pin_note(&id);
        assert!(store.with_state(|s| s.pinned_note_ids.is_empty()));
    }

    #[test]
    fn test_tags_are_set_like() {
        let store = LocalStore::new();
        let before = store.with_state(|s| s.custom_tags.len());
        store.add_tag("Warehouse");
        store.add_tag("Warehouse");
        assert_eq!(store.with_state(|s| s.custom_tags.len()), before + 1);
        store.remove_tag("Warehouse");
        assert_eq!(store.with_state(|s| s.custom_tags.len()), before);
    }

    #[test]
    fn test_delete_vehicle_clears_active_selection() {
        let store = LocalStore::new();
        let id = store.add_vehicle(Vehicle {
            id: RecordId::new(),
            name: "Truck".to_string(),
            make: "Ford".to_string(),
            model: "F-150".to_string(),
            year: 2021,
            color: "White".to_string(),
            license_plate: String::new(),
            is_default: true,
        });
        store.set_active_vehicle(Some(id.clone()));
        store.delete_vehicle(&id);
        assert_eq!(store.with_state(|s| s.active_vehicle_id.clone()), None);
    }

    #[test]
    fn test_streak_increments_on_consecutive_days() {
        let mut state = StoreState::default();
        let day1 = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        state.update_streak(day1);
        assert_eq!(state.streak_count, 1);
        // Same day: no-op.
        state.update_streak(day1);
        assert_eq!(state.streak_count, 1);
        // Next day: increment.
        state.update_streak(day1.succ_opt().unwrap());
        assert_eq!(state.streak_count, 2);
        // Gap: reset.
        state.update_streak(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        assert_eq!(state.streak_count, 1);
    }

    #[test]
    fn test_mutations_bump_revision() {
        let store = LocalStore::new();
        let rx = store.subscribe();
        let before = *rx.borrow();
        store.start_trip(10.0);
        store.end_trip(20.0);
        assert_eq!(*rx.borrow(), before + 2);
    }

    #[test]
    fn test_sync_snapshot_contains_settings() {
        let store = LocalStore::new();
        store.add_tag("Depot");
        let snapshot = store.sync_snapshot();
        assert!(snapshot.profile.is_some());
        assert!(snapshot
            .settings
            .custom_tags
            .as_ref()
            .unwrap()
            .contains(&"Depot".to_string()));
    }
}
