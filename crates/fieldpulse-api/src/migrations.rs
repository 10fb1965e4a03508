//! Database migrations
//!
//! Idempotent: every creation statement is guarded, and the version ledger
//! makes repeated invocation (startup plus every `POST /migrate`) a no-op.

use libsql::Connection;

use crate::error::AppError;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<(), AppError> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32, AppError> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: all synced tables
async fn migrate_v1(conn: &Connection) -> Result<(), AppError> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Singleton profile, upserted wholesale by the fixed id 'default'
        "CREATE TABLE IF NOT EXISTS fp_profile (
            id TEXT PRIMARY KEY NOT NULL DEFAULT 'default',
            name TEXT NOT NULL DEFAULT '',
            company TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT '',
            default_start_hour INTEGER NOT NULL DEFAULT 7,
            default_end_hour INTEGER NOT NULL DEFAULT 17,
            mileage_unit TEXT NOT NULL DEFAULT 'miles',
            fuel_unit TEXT NOT NULL DEFAULT 'gallons',
            onboarding_complete INTEGER NOT NULL DEFAULT 0,
            hourly_rate REAL NOT NULL DEFAULT 0,
            overtime_threshold REAL NOT NULL DEFAULT 8,
            overtime_multiplier REAL NOT NULL DEFAULT 1.5,
            weekly_goal_hours INTEGER NOT NULL DEFAULT 40,
            weekly_goal_miles INTEGER NOT NULL DEFAULT 500,
            weekly_goal_fuel_budget INTEGER NOT NULL DEFAULT 200,
            currency TEXT NOT NULL DEFAULT 'USD',
            date_format TEXT NOT NULL DEFAULT 'US',
            tags TEXT NOT NULL DEFAULT '[]',
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        )",
        // Time entries
        "CREATE TABLE IF NOT EXISTS fp_time_entries (
            id TEXT PRIMARY KEY NOT NULL,
            start_time TEXT NOT NULL DEFAULT '',
            end_time TEXT,
            break_minutes INTEGER NOT NULL DEFAULT 0,
            notes TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            date TEXT NOT NULL DEFAULT '',
            is_overtime INTEGER NOT NULL DEFAULT 0,
            hourly_rate REAL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        )",
        // Mileage entries
        "CREATE TABLE IF NOT EXISTS fp_mileage_entries (
            id TEXT PRIMARY KEY NOT NULL,
            date TEXT NOT NULL DEFAULT '',
            start_mileage REAL NOT NULL DEFAULT 0,
            end_mileage REAL,
            trip_miles REAL NOT NULL DEFAULT 0,
            start_location TEXT NOT NULL DEFAULT '',
            end_location TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            linked_time_entry_id TEXT,
            purpose TEXT NOT NULL DEFAULT 'work',
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        )",
        // Fuel logs
        "CREATE TABLE IF NOT EXISTS fp_fuel_logs (
            id TEXT PRIMARY KEY NOT NULL,
            date TEXT NOT NULL DEFAULT '',
            time TEXT NOT NULL DEFAULT '',
            mileage REAL NOT NULL DEFAULT 0,
            gallons REAL NOT NULL DEFAULT 0,
            cost_per_gallon REAL NOT NULL DEFAULT 0,
            total_cost REAL NOT NULL DEFAULT 0,
            station TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            receipt_photo TEXT,
            fuel_type TEXT NOT NULL DEFAULT 'regular',
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        )",
        // Daily notes; created/updated stamps come from the client here
        "CREATE TABLE IF NOT EXISTS fp_daily_notes (
            id TEXT PRIMARY KEY NOT NULL,
            date TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            what_i_did TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            mood TEXT,
            weather TEXT
        )",
        // Saved locations
        "CREATE TABLE IF NOT EXISTS fp_saved_locations (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            lat REAL,
            lng REAL,
            usage_count INTEGER NOT NULL DEFAULT 0,
            last_used TEXT NOT NULL DEFAULT ''
        )",
        // Vehicles
        "CREATE TABLE IF NOT EXISTS fp_vehicles (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            make TEXT NOT NULL DEFAULT '',
            model TEXT NOT NULL DEFAULT '',
            year INTEGER NOT NULL DEFAULT 2020,
            color TEXT NOT NULL DEFAULT '',
            license_plate TEXT NOT NULL DEFAULT '',
            is_default INTEGER NOT NULL DEFAULT 0
        )",
        // Geo pins recorded during shifts
        "CREATE TABLE IF NOT EXISTS fp_location_logs (
            id TEXT PRIMARY KEY NOT NULL,
            shift_id TEXT,
            lat REAL NOT NULL DEFAULT 0,
            lng REAL NOT NULL DEFAULT 0,
            place_name TEXT NOT NULL DEFAULT '',
            place_type TEXT NOT NULL DEFAULT '',
            timestamp TEXT NOT NULL DEFAULT ''
        )",
        // Settings key/value map; values are opaque JSON blobs
        "CREATE TABLE IF NOT EXISTS fp_settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL DEFAULT '{}'
        )",
        // Indexes for common queries
        "CREATE INDEX IF NOT EXISTS idx_time_entries_date ON fp_time_entries(date)",
        "CREATE INDEX IF NOT EXISTS idx_mileage_entries_date ON fp_mileage_entries(date)",
        "CREATE INDEX IF NOT EXISTS idx_fuel_logs_date ON fp_fuel_logs(date)",
        "CREATE INDEX IF NOT EXISTS idx_daily_notes_date ON fp_daily_notes(date)",
        "CREATE INDEX IF NOT EXISTS idx_location_logs_shift ON fp_location_logs(shift_id)",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
