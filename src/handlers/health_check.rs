//! # Health Check Handler
//!
//! Reports whether the application is running and can reach its database.
//! Load balancers and deployment tooling poll this endpoint.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::models::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
}

/// Health check endpoint.
///
/// GET /api/health/
///
/// # Returns
///
/// - `200 OK` - `{"status": "ok", "db": "ok"}`
/// - `503 Service Unavailable` - `{"status": "unavailable", "db": "unreachable"}`
#[instrument(skip_all)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Health check endpoint accessed");

    match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                db: "ok".to_string(),
            }),
        ),
        Err(e) => {
            error!(error = %e, "Database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    db: "unreachable".to_string(),
                }),
            )
        }
    }
}
