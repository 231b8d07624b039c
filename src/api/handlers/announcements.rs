use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Announcement, Category, CategoryFilter},
    error::{AppError, Result},
    web::AnnouncementDetails,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Announcement>>> {
    let filter = query
        .category
        .as_deref()
        .unwrap_or("all")
        .parse::<CategoryFilter>()
        .map_err(AppError::BadRequest)?;

    // Entries may have expired since the last push.
    state.portal_announcements.refresh();
    Ok(Json(state.portal_announcements.list(filter)))
}

pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Announcement>>> {
    let category = category.parse::<Category>().map_err(AppError::BadRequest)?;
    Ok(Json(state.portal_announcements.by_category(category)))
}

pub async fn view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnnouncementDetails>> {
    let details = state.portal_announcements.view_details(id).await?;
    Ok(Json(details))
}
