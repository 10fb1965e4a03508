//! Table mapping between client payload fields and storage columns.
//!
//! This is the only place camelCase wire names are translated to column
//! names. Collections are handled as loose JSON objects: an item
//! is projected onto exactly the columns whose keys are present, so a field
//! omitted by the client leaves the stored column untouched.

use fieldpulse_core::models::{UserProfile, WeeklyGoal};
use libsql::{Connection, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::AppError;

/// Storage type of a column; drives value translation in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    /// Stored as a 0/1 integer
    Boolean,
    /// Stored as serialized JSON text
    Json,
}

/// One wire-field-to-column pairing.
pub struct Column {
    pub field: &'static str,
    pub column: &'static str,
    pub kind: ColumnKind,
}

/// Mapping for one synced collection.
pub struct TableMapping {
    /// Payload key, e.g. `fuelLogs`
    pub key: &'static str,
    pub table: &'static str,
    /// Pull orders these tables by `created_at DESC`
    pub has_created_at: bool,
    pub columns: &'static [Column],
}

const fn col(field: &'static str, column: &'static str, kind: ColumnKind) -> Column {
    Column {
        field,
        column,
        kind,
    }
}

use ColumnKind::{Boolean, Integer, Json, Real, Text};

/// Every synced collection except the singleton profile and settings.
pub const TABLES: &[TableMapping] = &[
    TableMapping {
        key: "timeEntries",
        table: "fp_time_entries",
        has_created_at: true,
        columns: &[
            col("id", "id", Text),
            col("startTime", "start_time", Text),
            col("endTime", "end_time", Text),
            col("breakMinutes", "break_minutes", Integer),
            col("notes", "notes", Text),
            col("tags", "tags", Json),
            col("date", "date", Text),
            col("isOvertime", "is_overtime", Boolean),
            col("hourlyRate", "hourly_rate", Real),
        ],
    },
    TableMapping {
        key: "mileageEntries",
        table: "fp_mileage_entries",
        has_created_at: true,
        columns: &[
            col("id", "id", Text),
            col("date", "date", Text),
            col("startMileage", "start_mileage", Real),
            col("endMileage", "end_mileage", Real),
            col("tripMiles", "trip_miles", Real),
            col("startLocation", "start_location", Text),
            col("endLocation", "end_location", Text),
            col("notes", "notes", Text),
            col("linkedTimeEntryId", "linked_time_entry_id", Text),
            col("purpose", "purpose", Text),
        ],
    },
    TableMapping {
        key: "fuelLogs",
        table: "fp_fuel_logs",
        has_created_at: true,
        columns: &[
            col("id", "id", Text),
            col("date", "date", Text),
            col("time", "time", Text),
            col("mileage", "mileage", Real),
            col("gallons", "gallons", Real),
            col("costPerGallon", "cost_per_gallon", Real),
            col("totalCost", "total_cost", Real),
            col("station", "station", Text),
            col("notes", "notes", Text),
            col("receiptPhoto", "receipt_photo", Text),
            col("fuelType", "fuel_type", Text),
        ],
    },
    TableMapping {
        key: "dailyNotes",
        table: "fp_daily_notes",
        has_created_at: true,
        columns: &[
            col("id", "id", Text),
            col("date", "date", Text),
            col("content", "content", Text),
            col("tags", "tags", Json),
            col("whatIDid", "what_i_did", Text),
            col("createdAt", "created_at", Text),
            col("updatedAt", "updated_at", Text),
            col("mood", "mood", Text),
            col("weather", "weather", Text),
        ],
    },
    TableMapping {
        key: "savedLocations",
        table: "fp_saved_locations",
        has_created_at: false,
        columns: &[
            col("id", "id", Text),
            col("name", "name", Text),
            col("address", "address", Text),
            col("lat", "lat", Real),
            col("lng", "lng", Real),
            col("usageCount", "usage_count", Integer),
            col("lastUsed", "last_used", Text),
        ],
    },
    TableMapping {
        key: "vehicles",
        table: "fp_vehicles",
        has_created_at: false,
        columns: &[
            col("id", "id", Text),
            col("name", "name", Text),
            col("make", "make", Text),
            col("model", "model", Text),
            col("year", "year", Integer),
            col("color", "color", Text),
            col("licensePlate", "license_plate", Text),
            col("isDefault", "is_default", Boolean),
        ],
    },
    TableMapping {
        key: "locationLogs",
        table: "fp_location_logs",
        has_created_at: false,
        columns: &[
            col("id", "id", Text),
            col("shiftId", "shift_id", Text),
            col("lat", "lat", Real),
            col("lng", "lng", Real),
            col("placeName", "place_name", Text),
            col("placeType", "place_type", Text),
            col("timestamp", "timestamp", Text),
        ],
    },
];

/// Apply a full push payload: profile wholesale, every collection via
/// per-item partial upsert, settings key by key.
///
/// Tables are applied independently; a failure part-way leaves the earlier
/// ones upserted (no cross-table transaction).
pub async fn apply_snapshot(
    conn: &Connection,
    body: &JsonMap<String, JsonValue>,
) -> Result<(), AppError> {
    if let Some(profile_value) = body.get("profile") {
        if !profile_value.is_null() {
            let profile: UserProfile = serde_json::from_value(profile_value.clone())
                .map_err(|error| AppError::bad_request(format!("invalid profile: {error}")))?;
            upsert_profile(conn, &profile).await.map_err(|error| {
                tracing::error!(table = "fp_profile", %error, "upsert failed");
                error
            })?;
        }
    }

    for mapping in TABLES {
        let Some(JsonValue::Array(items)) = body.get(mapping.key) else {
            continue;
        };
        if items.is_empty() {
            continue;
        }
        let applied = upsert_items(conn, mapping, items).await.map_err(|error| {
            tracing::error!(table = mapping.table, %error, "upsert failed mid-push");
            error
        })?;
        tracing::debug!(table = mapping.table, applied, "upserted collection");
    }

    if let Some(JsonValue::Object(settings)) = body.get("settings") {
        upsert_settings(conn, settings).await?;
    }

    Ok(())
}

/// Assemble the full pull response: every collection plus the singleton
/// profile and the settings map.
pub async fn pull_snapshot(conn: &Connection) -> Result<JsonMap<String, JsonValue>, AppError> {
    let mut data = JsonMap::new();

    for mapping in TABLES {
        let rows = pull_table(conn, mapping).await.map_err(|error| {
            tracing::error!(table = mapping.table, %error, "pull failed");
            error
        })?;
        data.insert(
            mapping.key.to_string(),
            JsonValue::Array(rows.into_iter().map(JsonValue::Object).collect()),
        );
    }

    if let Some(profile) = pull_profile(conn).await? {
        let value = serde_json::to_value(profile)
            .map_err(|error| AppError::internal(error.to_string()))?;
        data.insert("profile".to_string(), value);
    }

    data.insert(
        "settings".to_string(),
        JsonValue::Object(pull_settings(conn).await?),
    );

    Ok(data)
}

/// Upsert each collection item onto the columns present in it.
///
/// Items lacking any updatable column besides the id are skipped; a key
/// present with `null` sets the column to NULL, an absent key leaves it
/// untouched.
pub async fn upsert_items(
    conn: &Connection,
    mapping: &TableMapping,
    items: &[JsonValue],
) -> Result<usize, AppError> {
    let mut applied = 0;
    for item in items {
        let Some(item) = item.as_object() else {
            continue;
        };
        let present: Vec<&Column> = mapping
            .columns
            .iter()
            .filter(|column| item.contains_key(column.field))
            .collect();
        let has_updatable = present.iter().any(|column| column.column != "id");
        if present.is_empty() || !has_updatable {
            continue;
        }

        let column_list = present
            .iter()
            .map(|column| column.column)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=present.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let update_list = present
            .iter()
            .enumerate()
            .filter(|(_, column)| column.column != "id")
            .map(|(index, column)| format!("{} = ?{}", column.column, index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({column_list}) VALUES ({placeholders})
             ON CONFLICT(id) DO UPDATE SET {update_list}",
            mapping.table
        );

        let params = present
            .iter()
            .map(|column| json_to_sql(column.field, &item[column.field], column.kind))
            .collect::<Result<Vec<_>, _>>()?;
        conn.execute(&sql, params).await?;
        applied += 1;
    }
    Ok(applied)
}

async fn pull_table(
    conn: &Connection,
    mapping: &TableMapping,
) -> Result<Vec<JsonMap<String, JsonValue>>, AppError> {
    let order = if mapping.has_created_at {
        " ORDER BY created_at DESC"
    } else {
        ""
    };
    let sql = format!("SELECT * FROM {}{order}", mapping.table);
    let mut rows = conn.query(&sql, ()).await?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        let mut object = JsonMap::new();
        for index in 0..rows.column_count() {
            let Some(name) = rows.column_name(index) else {
                continue;
            };
            let column = mapping.columns.iter().find(|column| column.column == name);
            // Columns without a wire mapping (server-generated timestamps)
            // pass through under their storage name; clients ignore them.
            let field = column.map_or(name, |column| column.field);
            object.insert(
                field.to_string(),
                sql_to_json(row.get_value(index)?, column.map(|column| column.kind)),
            );
        }
        out.push(object);
    }
    Ok(out)
}

/// Replace the singleton profile row wholesale under the fixed id.
pub async fn upsert_profile(conn: &Connection, profile: &UserProfile) -> Result<(), AppError> {
    let tags = serde_json::to_string(&profile.tags)
        .map_err(|error| AppError::internal(error.to_string()))?;

    let params: Vec<Value> = vec![
        Value::Text("default".to_string()),
        Value::Text(profile.name.clone()),
        Value::Text(profile.company.clone()),
        Value::Text(profile.role.clone()),
        Value::Integer(i64::from(profile.default_start_hour)),
        Value::Integer(i64::from(profile.default_end_hour)),
        Value::Text(enum_text(&profile.mileage_unit)?),
        Value::Text(enum_text(&profile.fuel_unit)?),
        Value::Integer(i64::from(profile.onboarding_complete)),
        Value::Real(profile.hourly_rate),
        Value::Real(profile.overtime_threshold),
        Value::Real(profile.overtime_multiplier),
        Value::Integer(i64::from(profile.weekly_goal.hours_target)),
        Value::Integer(i64::from(profile.weekly_goal.miles_target)),
        Value::Integer(i64::from(profile.weekly_goal.fuel_budget)),
        Value::Text(profile.currency.clone()),
        Value::Text(enum_text(&profile.date_format)?),
        Value::Text(tags),
    ];

    conn.execute(
        "INSERT INTO fp_profile (id, name, company, role, default_start_hour, default_end_hour,
            mileage_unit, fuel_unit, onboarding_complete, hourly_rate, overtime_threshold,
            overtime_multiplier, weekly_goal_hours, weekly_goal_miles, weekly_goal_fuel_budget,
            currency, date_format, tags, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
            strftime('%Y-%m-%dT%H:%M:%fZ','now'))
         ON CONFLICT (id) DO UPDATE SET
            name = ?2, company = ?3, role = ?4, default_start_hour = ?5, default_end_hour = ?6,
            mileage_unit = ?7, fuel_unit = ?8, onboarding_complete = ?9, hourly_rate = ?10,
            overtime_threshold = ?11, overtime_multiplier = ?12, weekly_goal_hours = ?13,
            weekly_goal_miles = ?14, weekly_goal_fuel_budget = ?15, currency = ?16,
            date_format = ?17, tags = ?18, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')",
        params,
    )
    .await?;
    Ok(())
}

/// Read the singleton profile row, if one has ever been pushed.
pub async fn pull_profile(conn: &Connection) -> Result<Option<UserProfile>, AppError> {
    let mut rows = conn
        .query(
            "SELECT name, company, role, default_start_hour, default_end_hour, mileage_unit,
                    fuel_unit, onboarding_complete, hourly_rate, overtime_threshold,
                    overtime_multiplier, weekly_goal_hours, weekly_goal_miles,
                    weekly_goal_fuel_budget, currency, date_format, tags
             FROM fp_profile WHERE id = ?1",
            ["default"],
        )
        .await?;

    let Some(row) = rows.next().await? else {
        return Ok(None);
    };

    let tags: Vec<String> =
        serde_json::from_str(&row.get::<String>(16)?).unwrap_or_default();

    Ok(Some(UserProfile {
        name: row.get(0)?,
        company: row.get(1)?,
        role: row.get(2)?,
        default_start_hour: u32::try_from(row.get::<i64>(3)?).unwrap_or_default(),
        default_end_hour: u32::try_from(row.get::<i64>(4)?).unwrap_or_default(),
        mileage_unit: text_enum(&row.get::<String>(5)?),
        fuel_unit: text_enum(&row.get::<String>(6)?),
        onboarding_complete: row.get::<i32>(7)? != 0,
        hourly_rate: row.get(8)?,
        overtime_threshold: row.get(9)?,
        overtime_multiplier: row.get(10)?,
        weekly_goal: WeeklyGoal {
            hours_target: u32::try_from(row.get::<i64>(11)?).unwrap_or_default(),
            miles_target: u32::try_from(row.get::<i64>(12)?).unwrap_or_default(),
            fuel_budget: u32::try_from(row.get::<i64>(13)?).unwrap_or_default(),
        },
        currency: row.get(14)?,
        date_format: text_enum(&row.get::<String>(15)?),
        tags,
    }))
}

/// Upsert each settings pair; the value is stored as opaque JSON text.
pub async fn upsert_settings(
    conn: &Connection,
    settings: &JsonMap<String, JsonValue>,
) -> Result<(), AppError> {
    for (key, value) in settings {
        conn.execute(
            "INSERT INTO fp_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = ?2",
            vec![Value::Text(key.clone()), Value::Text(value.to_string())],
        )
        .await?;
    }
    Ok(())
}

/// Read the settings map, parsing each stored blob back to a native value.
pub async fn pull_settings(conn: &Connection) -> Result<JsonMap<String, JsonValue>, AppError> {
    let mut rows = conn.query("SELECT key, value FROM fp_settings", ()).await?;
    let mut settings = JsonMap::new();
    while let Some(row) = rows.next().await? {
        let key: String = row.get(0)?;
        let raw: String = row.get(1)?;
        let value = serde_json::from_str(&raw).unwrap_or(JsonValue::String(raw));
        settings.insert(key, value);
    }
    Ok(settings)
}

fn json_to_sql(field: &str, value: &JsonValue, kind: ColumnKind) -> Result<Value, AppError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let converted = match kind {
        ColumnKind::Text => value.as_str().map(|text| Value::Text(text.to_string())),
        ColumnKind::Integer => value.as_i64().map(Value::Integer),
        ColumnKind::Real => value.as_f64().map(Value::Real),
        ColumnKind::Boolean => value
            .as_bool()
            .map(|flag| Value::Integer(i64::from(flag)))
            .or_else(|| value.as_i64().map(|raw| Value::Integer(i64::from(raw != 0)))),
        ColumnKind::Json => Some(Value::Text(value.to_string())),
    };
    converted.ok_or_else(|| AppError::bad_request(format!("field {field} has an invalid type")))
}

fn sql_to_json(value: Value, kind: Option<ColumnKind>) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(raw) => match kind {
            Some(ColumnKind::Boolean) => JsonValue::Bool(raw != 0),
            _ => JsonValue::from(raw),
        },
        Value::Real(raw) => serde_json::Number::from_f64(raw)
            .map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(raw) => match kind {
            Some(ColumnKind::Json) => {
                serde_json::from_str(&raw).unwrap_or(JsonValue::String(raw))
            }
            _ => JsonValue::String(raw),
        },
        Value::Blob(_) => JsonValue::Null,
    }
}

fn enum_text<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    match serde_json::to_value(value) {
        Ok(JsonValue::String(text)) => Ok(text),
        _ => Err(AppError::internal(
            "enum value did not serialize to text".to_string(),
        )),
    }
}

fn text_enum<T: serde::de::DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_value(JsonValue::String(raw.to_string())).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fuel_mapping() -> &'static TableMapping {
        TABLES.iter().find(|mapping| mapping.key == "fuelLogs").unwrap()
    }

    async fn count_rows(conn: &Connection, table: &str) -> i64 {
        let mut rows = conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await
            .unwrap();
        rows.next().await.unwrap().unwrap().get(0).unwrap()
    }

    fn sample_fuel_item(id: &str) -> JsonValue {
        json!({
            "id": id,
            "date": "2025-06-02",
            "time": "08:30",
            "mileage": 48210.0,
            "gallons": 10.0,
            "costPerGallon": 3.5,
            "totalCost": 35.0,
            "station": "Shell",
            "notes": "",
            "receiptPhoto": null,
            "fuelType": "regular"
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_is_idempotent() {
        let conn = db::open_in_memory().await;
        let items = vec![sample_fuel_item("f1")];

        upsert_items(&conn, fuel_mapping(), &items).await.unwrap();
        upsert_items(&conn, fuel_mapping(), &items).await.unwrap();

        assert_eq!(count_rows(&conn, "fp_fuel_logs").await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_partial_item_leaves_missing_columns_untouched() {
        let conn = db::open_in_memory().await;
        upsert_items(&conn, fuel_mapping(), &[sample_fuel_item("f1")])
            .await
            .unwrap();

        // A later push that omits `gallons` must not null it out.
        let partial = json!({ "id": "f1", "station": "BP" });
        upsert_items(&conn, fuel_mapping(), &[partial]).await.unwrap();

        let mut rows = conn
            .query("SELECT station, gallons FROM fp_fuel_logs WHERE id = 'f1'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), "BP");
        assert!((row.get::<f64>(1).unwrap() - 10.0).abs() < f64::EPSILON);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_null_value_clears_column() {
        let conn = db::open_in_memory().await;
        upsert_items(&conn, fuel_mapping(), &[sample_fuel_item("f1")])
            .await
            .unwrap();

        let cleared = json!({ "id": "f1", "notes": null });
        upsert_items(&conn, fuel_mapping(), &[cleared]).await.unwrap();

        let mut rows = conn
            .query("SELECT notes FROM fp_fuel_logs WHERE id = 'f1'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get_value(0).unwrap(), Value::Null);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_item_with_only_id_is_skipped() {
        let conn = db::open_in_memory().await;
        let applied = upsert_items(&conn, fuel_mapping(), &[json!({ "id": "f1" })])
            .await
            .unwrap();
        assert_eq!(applied, 0);
        assert_eq!(count_rows(&conn, "fp_fuel_logs").await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_conflict_updates_instead_of_duplicating() {
        let conn = db::open_in_memory().await;
        let mapping = TABLES
            .iter()
            .find(|mapping| mapping.key == "mileageEntries")
            .unwrap();

        let first = json!({
            "id": "m1", "date": "2025-06-02",
            "startMileage": 100.0, "endMileage": 140.0, "tripMiles": 40.0,
            "purpose": "work"
        });
        upsert_items(&conn, mapping, &[first]).await.unwrap();

        let second = json!({ "id": "m1", "endMileage": 150.0, "tripMiles": 50.0 });
        upsert_items(&conn, mapping, &[second]).await.unwrap();

        assert_eq!(count_rows(&conn, "fp_mileage_entries").await, 1);
        let mut rows = conn
            .query(
                "SELECT trip_miles FROM fp_mileage_entries WHERE id = 'm1'",
                (),
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert!((row.get::<f64>(0).unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pull_translates_columns_and_types() {
        let conn = db::open_in_memory().await;
        let mapping = TABLES.iter().find(|mapping| mapping.key == "timeEntries").unwrap();
        let item = json!({
            "id": "t1",
            "startTime": "2025-06-02T08:00:00Z",
            "endTime": null,
            "breakMinutes": 30,
            "tags": ["CA", "Field"],
            "date": "2025-06-02",
            "isOvertime": true,
            "notes": ""
        });
        upsert_items(&conn, mapping, &[item]).await.unwrap();

        let rows = pull_table(&conn, mapping).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["startTime"], "2025-06-02T08:00:00Z");
        assert_eq!(row["isOvertime"], true);
        assert_eq!(row["tags"], json!(["CA", "Field"]));
        assert_eq!(row["endTime"], JsonValue::Null);
        // Server-generated timestamp passes through under its storage name.
        assert!(row.contains_key("created_at"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pull_orders_by_created_at_desc() {
        let conn = db::open_in_memory().await;
        upsert_items(
            &conn,
            fuel_mapping(),
            &[sample_fuel_item("f1"), sample_fuel_item("f2")],
        )
        .await
        .unwrap();
        conn.execute(
            "UPDATE fp_fuel_logs SET created_at = '2025-01-01T00:00:00.000Z' WHERE id = 'f1'",
            (),
        )
        .await
        .unwrap();
        conn.execute(
            "UPDATE fp_fuel_logs SET created_at = '2025-06-01T00:00:00.000Z' WHERE id = 'f2'",
            (),
        )
        .await
        .unwrap();

        let rows = pull_table(&conn, fuel_mapping()).await.unwrap();
        assert_eq!(rows[0]["id"], "f2");
        assert_eq!(rows[1]["id"], "f1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_locally_deleted_row_survives_push() {
        let conn = db::open_in_memory().await;
        upsert_items(&conn, fuel_mapping(), &[sample_fuel_item("f1")])
            .await
            .unwrap();

        // The client deleted f1 locally; the next push simply omits it.
        // The API only upserts, never deletes, so the row remains.
        let body = json!({ "fuelLogs": [] });
        apply_snapshot(&conn, body.as_object().unwrap())
            .await
            .unwrap();

        assert_eq!(count_rows(&conn, "fp_fuel_logs").await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_profile_round_trip() {
        let conn = db::open_in_memory().await;
        let mut profile = UserProfile {
            name: "Sam".to_string(),
            hourly_rate: 32.5,
            onboarding_complete: true,
            tags: vec!["crew-a".to_string()],
            ..UserProfile::default()
        };
        profile.weekly_goal.miles_target = 650;

        upsert_profile(&conn, &profile).await.unwrap();
        let loaded = pull_profile(&conn).await.unwrap().unwrap();
        assert_eq!(loaded, profile);

        // Second upsert replaces wholesale rather than adding a row.
        profile.name = "Sam Jr".to_string();
        upsert_profile(&conn, &profile).await.unwrap();
        assert_eq!(count_rows(&conn, "fp_profile").await, 1);
        assert_eq!(pull_profile(&conn).await.unwrap().unwrap().name, "Sam Jr");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_profile_pulls_as_none() {
        let conn = db::open_in_memory().await;
        assert!(pull_profile(&conn).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_settings_round_trip_preserves_value_types() {
        let conn = db::open_in_memory().await;
        let mut settings = JsonMap::new();
        settings.insert("customTags".to_string(), json!(["CA", "Field"]));
        settings.insert("pinnedNoteIds".to_string(), json!(["n1"]));
        settings.insert("syncIntervalSecs".to_string(), json!(3));

        upsert_settings(&conn, &settings).await.unwrap();
        let loaded = pull_settings(&conn).await.unwrap();
        assert_eq!(loaded, settings);

        // Upserting a key again replaces its value.
        settings.insert("customTags".to_string(), json!(["TX"]));
        upsert_settings(&conn, &settings).await.unwrap();
        assert_eq!(pull_settings(&conn).await.unwrap()["customTags"], json!(["TX"]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_field_type_is_rejected() {
        let conn = db::open_in_memory().await;
        let bad = json!({ "id": "f1", "gallons": "lots" });
        let error = upsert_items(&conn, fuel_mapping(), &[bad]).await.unwrap_err();
        assert!(error.to_string().contains("gallons"));
    }
}
