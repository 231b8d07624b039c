use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Announcement, AnnouncementPatch, Notified},
    error::Result,
    web::{AdminAnnouncementList, CreateAnnouncementRequest},
};

pub async fn list(State(state): State<AppState>) -> Json<AdminAnnouncementList> {
    Json(state.admin_announcements.list())
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Notified<Announcement>>)> {
    let created = state.admin_announcements.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AnnouncementPatch>,
) -> Result<Json<Notified<Announcement>>> {
    let updated = state.admin_announcements.edit(id, patch).await?;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notified<Uuid>>> {
    let deleted = state.admin_announcements.delete(id).await?;
    Ok(Json(deleted))
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notified<Announcement>>> {
    let toggled = state.admin_announcements.toggle_status(id).await?;
    Ok(Json(toggled))
}
