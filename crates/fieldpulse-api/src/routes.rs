use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use libsql::Connection;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::{migrations, tables};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub conn: Connection,
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/sync", get(pull_sync).post(push_sync))
        .route("/migrate", post(run_migrations))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct PullResponse {
    success: bool,
    data: JsonValue,
}

#[derive(Debug, Serialize)]
struct AckResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    success: bool,
    database: &'static str,
    timestamp: i64,
}

/// `GET /sync` - pull the full remote snapshot.
async fn pull_sync(State(state): State<AppState>) -> Result<Json<PullResponse>, AppError> {
    let data = tables::pull_snapshot(&state.conn).await?;
    Ok(Json(PullResponse {
        success: true,
        data: JsonValue::Object(data),
    }))
}

/// `POST /sync` - upsert the full client snapshot.
async fn push_sync(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<AckResponse>, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let body = body
        .as_object()
        .ok_or_else(|| AppError::bad_request("body must be a JSON object"))?;

    tables::apply_snapshot(&state.conn, body).await?;
    Ok(Json(AckResponse {
        success: true,
        message: "Sync complete".to_string(),
    }))
}

/// `POST /migrate` - idempotently ensure the schema exists.
async fn run_migrations(State(state): State<AppState>) -> Result<Json<AckResponse>, AppError> {
    migrations::run(&state.conn).await?;
    Ok(Json(AckResponse {
        success: true,
        message: "Migrations complete".to_string(),
    }))
}

/// `GET /health` - liveness plus a backing-store connectivity probe.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.conn.query("SELECT 1", ()).await {
        Ok(_) => "ok",
        Err(error) => {
            tracing::warn!(%error, "health probe failed to reach database");
            "error"
        }
    };
    Json(HealthResponse {
        success: database == "ok",
        database,
        timestamp: Utc::now().timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use fieldpulse_core::models::ProfilePatch;
    use fieldpulse_core::store::LocalStore;
    use fieldpulse_core::sync::SyncSnapshot;
    use pretty_assertions::assert_eq;

    async fn test_state() -> AppState {
        AppState {
            config: Arc::new(AppConfig {
                bind_addr: String::new(),
                db_path: ":memory:".to_string(),
            }),
            conn: db::open_in_memory().await,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_push_then_pull_round_trips_records() {
        let state = test_state().await;

        let store = LocalStore::new();
        store.set_profile(ProfilePatch {
            name: Some("Sam".to_string()),
            hourly_rate: Some(28.0),
            ..ProfilePatch::default()
        });
        store.start_trip(100.0);
        store.end_trip(140.0);
        store.start_timer();
        store.stop_timer(15);
        let snapshot = store.sync_snapshot();

        let body = serde_json::to_value(&snapshot).unwrap();
        push_sync(State(state.clone()), Ok(Json(body)))
            .await
            .unwrap();

        let response = pull_sync(State(state)).await.unwrap();
        let pulled: SyncSnapshot = serde_json::from_value(response.0.data).unwrap();

        // Field-for-field equal modulo server-generated timestamps, which
        // the client shape does not carry.
        assert_eq!(pulled.mileage_entries, snapshot.mileage_entries);
        assert_eq!(pulled.time_entries, snapshot.time_entries);
        assert_eq!(pulled.profile, snapshot.profile);
        assert_eq!(pulled.settings.custom_tags, snapshot.settings.custom_tags);
        assert_eq!(
            pulled.settings.pinned_note_ids,
            snapshot.settings.pinned_note_ids
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_push_rejects_non_object_body() {
        let state = test_state().await;
        let error = push_sync(State(state), Ok(Json(serde_json::json!([1, 2]))))
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::BadRequest(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrate_endpoint_is_idempotent() {
        let state = test_state().await;
        run_migrations(State(state.clone())).await.unwrap();
        let response = run_migrations(State(state)).await.unwrap();
        assert!(response.0.success);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_health_reports_database_ok() {
        let state = test_state().await;
        let response = health(State(state)).await;
        assert!(response.0.success);
        assert_eq!(response.0.database, "ok");
    }
}
