use axum::{extract::State, http::StatusCode, Json, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct BoardInfo {
    pub version: String,
    pub announcements: usize,
    pub active: usize,
    pub total_views: u64,
    pub persistent: bool,
    pub revision: u64,
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Campus Connect API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "api": "/api",
            "announcements": "/api/announcements",
            "admin": "/admin/announcements"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.service_context.db_pool {
        None => "disabled",
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "ok",
            Err(e) => {
                tracing::error!("Database health check failed: {}", e);
                "unreachable"
            }
        },
    };

    let (status, label) = if database == "unreachable" {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    } else {
        (StatusCode::OK, "healthy")
    };

    (status, Json(json!({
        "status": label,
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn api_info(State(state): State<AppState>) -> Json<BoardInfo> {
    let stats = state.admin_announcements.stats();
    Json(BoardInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        announcements: stats.total,
        active: stats.active,
        total_views: stats.total_views,
        persistent: state.service_context.announcement_service.is_persistent(),
        revision: state.admin_announcements.revision(),
    })
}
