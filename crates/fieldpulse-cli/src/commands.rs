//! Command implementations over the core library.

use chrono::{Local, Utc};
use fieldpulse_core::models::{DailyNote, FuelLog, FuelType, Mood, RecordId};
use fieldpulse_core::store::{LocalStore, StoreState, TimerState, TripState};
use fieldpulse_core::sync::{HttpSyncClient, SyncApi, SyncConfig, SyncEngine};
use fieldpulse_core::util::today;

use crate::error::CliError;

pub struct FuelArgs {
    pub mileage: f64,
    pub gallons: f64,
    pub cost_per_gallon: f64,
    pub station: String,
    pub notes: String,
    pub fuel_type: FuelType,
}

pub async fn timer_start(store: &LocalStore, server: Option<&str>) -> Result<(), CliError> {
    store.start_timer();
    println!("Shift timer started");
    push_best_effort(store, server).await;
    Ok(())
}

pub async fn timer_stop(
    store: &LocalStore,
    break_minutes: u32,
    server: Option<&str>,
) -> Result<(), CliError> {
    let id = store
        .stop_timer(break_minutes)
        .ok_or(CliError::TimerNotRunning)?;
    let summary = store.with_state(|s| {
        s.time_entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| (e.worked_hours(), e.is_overtime))
    });
    if let Some((worked, overtime)) = summary {
        println!(
            "Shift finalized: {worked:.2}h worked{} ({id})",
            if overtime { ", overtime" } else { "" },
        );
    }
    push_best_effort(store, server).await;
    Ok(())
}

pub async fn trip_start(
    store: &LocalStore,
    odometer: f64,
    server: Option<&str>,
) -> Result<(), CliError> {
    store.start_trip(odometer);
    println!("Trip started at odometer {odometer:.1}");
    push_best_effort(store, server).await;
    Ok(())
}

pub async fn trip_end(
    store: &LocalStore,
    odometer: f64,
    server: Option<&str>,
) -> Result<(), CliError> {
    let id = store.end_trip(odometer).ok_or(CliError::TripNotRunning)?;
    let miles = store.with_state(|s| {
        s.mileage_entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.trip_miles)
    });
    if let Some(miles) = miles {
        println!("Trip finalized: {miles:.1} miles ({id})");
    }
    push_best_effort(store, server).await;
    Ok(())
}

pub async fn fuel_add(
    store: &LocalStore,
    args: FuelArgs,
    server: Option<&str>,
) -> Result<(), CliError> {
    let total_cost = args.gallons * args.cost_per_gallon;
    let id = store.add_fuel_log(FuelLog {
        id: RecordId::new(),
        date: today(),
        time: Local::now().format("%H:%M").to_string(),
        mileage: args.mileage,
        gallons: args.gallons,
        cost_per_gallon: args.cost_per_gallon,
        total_cost,
        station: args.station,
        notes: args.notes,
        receipt_photo: None,
        fuel_type: args.fuel_type,
    });
    println!("Fuel logged: {:.3} gal for ${total_cost:.2} ({id})", args.gallons);
    push_best_effort(store, server).await;
    Ok(())
}

pub async fn note_add(
    store: &LocalStore,
    content: &str,
    mood: Option<Mood>,
    server: Option<&str>,
) -> Result<(), CliError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CliError::EmptyContent);
    }
    let now = Utc::now();
    let id = store.add_daily_note(DailyNote {
        id: RecordId::new(),
        date: today(),
        content: content.to_string(),
        tags: Vec::new(),
        what_i_did: String::new(),
        created_at: now,
        updated_at: now,
        mood,
        weather: None,
    });
    println!("Note added ({id})");
    push_best_effort(store, server).await;
    Ok(())
}

pub async fn status(store: &LocalStore, server: Option<&str>) -> Result<(), CliError> {
    store.with_state(|s| {
        match s.timer {
            TimerState::Running { started_at } => {
                println!("Timer:   running since {}", started_at.with_timezone(&Local));
            }
            TimerState::Idle => println!("Timer:   idle"),
        }
        match s.trip {
            TripState::Running { start_mileage } => {
                println!("Trip:    running from odometer {start_mileage:.1}");
            }
            TripState::Idle => println!("Trip:    idle"),
        }
        println!(
            "Records: {} shifts, {} trips, {} fuel logs, {} notes",
            s.time_entries.len(),
            s.mileage_entries.len(),
            s.fuel_logs.len(),
            s.daily_notes.len()
        );
        println!("Streak:  {} day(s)", s.streak_count);
    });

    match server {
        Some(server) => {
            let client = HttpSyncClient::new(server)?;
            match client.health().await {
                Ok(()) => println!("Server:  {server} (reachable)"),
                Err(error) => println!("Server:  {server} (unreachable: {error})"),
            }
        }
        None => println!("Server:  not configured"),
    }
    Ok(())
}

pub async fn sync_now(store: &LocalStore, server: Option<&str>) -> Result<(), CliError> {
    let engine = engine(store, server)?;
    engine.sync_now().await?;
    println!("Synced to server");
    Ok(())
}

pub async fn pull_now(store: &LocalStore, server: Option<&str>) -> Result<(), CliError> {
    let before = store.with_state(count_records);
    let engine = engine(store, server)?;
    engine.pull_now().await?;
    let after = store.with_state(count_records);
    println!("Pulled from server: {} new record(s)", after - before);
    Ok(())
}

pub async fn migrate(server: Option<&str>) -> Result<(), CliError> {
    let server = server.ok_or(CliError::SyncNotConfigured)?;
    let client = HttpSyncClient::new(server)?;
    client.migrate().await?;
    println!("Server schema is up to date");
    Ok(())
}

fn engine(
    store: &LocalStore,
    server: Option<&str>,
) -> Result<SyncEngine<HttpSyncClient>, CliError> {
    let server = server.ok_or(CliError::SyncNotConfigured)?;
    let client = HttpSyncClient::new(server)?;
    Ok(SyncEngine::new(store.clone(), client, SyncConfig::default()))
}

fn count_records(state: &StoreState) -> usize {
    state.time_entries.len()
        + state.mileage_entries.len()
        + state.fuel_logs.len()
        + state.daily_notes.len()
        + state.saved_locations.len()
        + state.vehicles.len()
        + state.location_logs.len()
}

/// Push after a mutating command when a server is configured. Failures are
/// logged, never fatal; the change is already saved locally and will go out
/// with the next successful sync.
async fn push_best_effort(store: &LocalStore, server: Option<&str>) {
    let Some(server) = server else { return };
    match engine(store, Some(server)) {
        Ok(engine) => {
            if let Err(error) = engine.sync_now().await {
                tracing::warn!(%error, "sync failed; will retry on the next sync");
            }
        }
        Err(error) => tracing::warn!(%error, "sync is misconfigured"),
    }
}
