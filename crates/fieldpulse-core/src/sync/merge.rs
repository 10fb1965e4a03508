//! Pull reconciliation: merge a remote snapshot into local state.

use std::collections::HashSet;

use crate::models::RecordId;
use crate::store::StoreState;

use super::snapshot::SyncSnapshot;

/// Merge a remote snapshot into the local state.
///
/// Profile and settings are overwritten wholesale when the server supplied
/// them. Every record collection is merged union-by-id: only remote records
/// whose id is absent locally are inserted; on an id collision the local
/// record wins untouched. There is no field-level merge and no timestamp
/// comparison.
pub fn merge_remote(state: &mut StoreState, remote: SyncSnapshot) {
    if let Some(profile) = remote.profile {
        state.profile = profile;
    }
    if let Some(custom_tags) = remote.settings.custom_tags {
        state.custom_tags = custom_tags;
    }
    if let Some(pinned_note_ids) = remote.settings.pinned_note_ids {
        state.pinned_note_ids = pinned_note_ids;
    }

    merge_collection(&mut state.time_entries, remote.time_entries, |e| &e.id);
    merge_collection(&mut state.mileage_entries, remote.mileage_entries, |e| {
        &e.id
    });
    merge_collection(&mut state.fuel_logs, remote.fuel_logs, |l| &l.id);
    merge_collection(&mut state.daily_notes, remote.daily_notes, |n| &n.id);
    merge_collection(&mut state.saved_locations, remote.saved_locations, |l| {
        &l.id
    });
    merge_collection(&mut state.vehicles, remote.vehicles, |v| &v.id);
    merge_collection(&mut state.location_logs, remote.location_logs, |l| &l.id);
}

fn merge_collection<T>(local: &mut Vec<T>, remote: Vec<T>, id: impl Fn(&T) -> &RecordId) {
    let existing: HashSet<RecordId> = local.iter().map(|item| id(item).clone()).collect();
    local.extend(
        remote
            .into_iter()
            .filter(|item| !existing.contains(id(item))),
    );
}
