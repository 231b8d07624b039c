use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Announcement, Attachment},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    title: String,
    content: String,
    category: String,
    priority: String,
    posted_by: String,
    posted_date: NaiveDateTime,
    expiry_date: Option<NaiveDateTime>,
    image_url: Option<String>,
    attachments: Option<String>,
    is_active: i32,
    views: i64,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        let attachments = row
            .attachments
            .as_deref()
            .map(serde_json::from_str::<Vec<Attachment>>)
            .transpose()?;

        Ok(Announcement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            content: row.content,
            category: row.category.parse().map_err(AppError::Database)?,
            priority: row.priority.parse().map_err(AppError::Database)?,
            posted_by: row.posted_by,
            posted_date: DateTime::from_naive_utc_and_offset(row.posted_date, Utc),
            expiry_date: row.expiry_date.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            image_url: row.image_url,
            attachments,
            is_active: row.is_active != 0,
            views: u64::try_from(row.views).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn load_all(&self) -> Result<Vec<Announcement>> {
        // Upserts keep the original rowid, so rowid order is insertion order.
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, content, category, priority, posted_by,
                   posted_date, expiry_date, image_url, attachments, is_active, views
            FROM announcements
            ORDER BY rowid DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }

    async fn save(&self, announcement: &Announcement) -> Result<()> {
        let attachments_json = announcement
            .attachments
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let views = i64::try_from(announcement.views).unwrap_or(i64::MAX);

        sqlx::query(
            r#"
            INSERT INTO announcements (
                id, title, content, category, priority, posted_by,
                posted_date, expiry_date, image_url, attachments, is_active, views
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                category = excluded.category,
                priority = excluded.priority,
                posted_by = excluded.posted_by,
                posted_date = excluded.posted_date,
                expiry_date = excluded.expiry_date,
                image_url = excluded.image_url,
                attachments = excluded.attachments,
                is_active = excluded.is_active,
                views = MAX(announcements.views, excluded.views)
            "#
        )
        .bind(announcement.id.to_string())
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.category.as_str())
        .bind(announcement.priority.as_str())
        .bind(&announcement.posted_by)
        .bind(announcement.posted_date.naive_utc())
        .bind(announcement.expiry_date.map(|dt| dt.naive_utc()))
        .bind(&announcement.image_url)
        .bind(attachments_json)
        .bind(if announcement.is_active { 1i32 } else { 0i32 })
        .bind(views)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
