use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AnnouncementsConfig,
    domain::{
        Announcement, AnnouncementInput, AnnouncementPatch, AnnouncementStats, Attachment,
        Category, Notification, Notified, Priority,
    },
    error::{AppError, Result},
    repository::Subscription,
    service::{clock::Clock, AnnouncementService},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub posted_by: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminAnnouncementList {
    pub announcements: Vec<Announcement>,
    pub stats: AnnouncementStats,
}

struct AdminViewState {
    announcements: Arc<[Announcement]>,
    stats: AnnouncementStats,
    revision: u64,
}

/// Admin console view: the whole collection plus running statistics.
pub struct AdminAnnouncementsView {
    service: Arc<AnnouncementService>,
    clock: Arc<dyn Clock>,
    default_posted_by: String,
    notification_duration_ms: u64,
    state: Arc<RwLock<AdminViewState>>,
    _subscription: Subscription,
}

impl AdminAnnouncementsView {
    pub fn new(
        service: Arc<AnnouncementService>,
        clock: Arc<dyn Clock>,
        config: &AnnouncementsConfig,
    ) -> Self {
        let state = Arc::new(RwLock::new(AdminViewState {
            announcements: Vec::<Announcement>::new().into(),
            stats: AnnouncementStats::default(),
            revision: 0,
        }));

        let sink = state.clone();
        let subscription = service.store().subscribe(move |snapshot| {
            let mut view = sink.write().unwrap_or_else(PoisonError::into_inner);
            view.stats = AnnouncementStats::from_announcements(&snapshot.announcements);
            view.announcements = snapshot.announcements.clone();
            view.revision = snapshot.revision;
            tracing::debug!("Admin view received {} announcements", view.stats.total);
        });

        Self {
            service,
            clock,
            default_posted_by: config.default_posted_by.clone(),
            notification_duration_ms: config.notification_duration_ms,
            state,
            _subscription: subscription,
        }
    }

    fn success(&self, message: &str) -> Notification {
        Notification::success(message).with_duration(self.notification_duration_ms)
    }

    pub fn list(&self) -> AdminAnnouncementList {
        let view = self.state.read().unwrap_or_else(PoisonError::into_inner);
        AdminAnnouncementList {
            announcements: view.announcements.to_vec(),
            stats: view.stats,
        }
    }

    pub fn stats(&self) -> AnnouncementStats {
        self.state.read().unwrap_or_else(PoisonError::into_inner).stats
    }

    pub fn revision(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).revision
    }

    pub async fn create(&self, mut request: CreateAnnouncementRequest) -> Result<Notified<Announcement>> {
        request.title = request.title.trim().to_string();
        request.content = request.content.trim().to_string();
        request.validate()?;

        let posted_by = request
            .posted_by
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.default_posted_by.clone());

        let input = AnnouncementInput {
            title: request.title,
            content: request.content,
            category: request.category.unwrap_or(Category::General),
            priority: request.priority.unwrap_or(Priority::Normal),
            posted_by,
            posted_date: self.clock.now(),
            expiry_date: request.expiry_date,
            image_url: request.image_url,
            attachments: request.attachments,
            is_active: request.is_active.unwrap_or(true),
        };

        let created = self.service.add(input).await?;
        Ok(Notified::new(created, self.success("Announcement created successfully!")))
    }

    pub async fn edit(&self, id: Uuid, patch: AnnouncementPatch) -> Result<Notified<Announcement>> {
        let patch = patch.trimmed();
        patch.validate()?;

        let updated = self
            .service
            .update(id, patch)
            .await?
            .ok_or_else(not_found)?;
        Ok(Notified::new(updated, self.success("Announcement updated successfully!")))
    }

    pub async fn delete(&self, id: Uuid) -> Result<Notified<Uuid>> {
        if !self.service.delete(id).await? {
            return Err(not_found());
        }
        Ok(Notified::new(id, self.success("Announcement deleted")))
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Notified<Announcement>> {
        let toggled = self
            .service
            .toggle_active(id)
            .await?
            .ok_or_else(not_found)?;
        Ok(Notified::new(toggled, self.success("Status updated")))
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Announcement not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Settings,
        domain::{demo_announcements, utc_date},
        repository::AnnouncementStore,
        service::clock::FixedClock,
    };

    fn view() -> (Arc<AnnouncementService>, AdminAnnouncementsView) {
        let store = Arc::new(AnnouncementStore::with_inputs(demo_announcements()));
        let service = Arc::new(AnnouncementService::in_memory(store));
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(utc_date(2024, 11, 29)));
        let view = AdminAnnouncementsView::new(service.clone(), clock, &Settings::default().announcements);
        (service, view)
    }

    fn request(title: &str, content: &str) -> CreateAnnouncementRequest {
        CreateAnnouncementRequest {
            title: title.to_string(),
            content: content.to_string(),
            category: None,
            priority: None,
            posted_by: None,
            expiry_date: None,
            image_url: None,
            attachments: None,
            is_active: None,
        }
    }

    #[test]
    fn test_stats_follow_store() {
        let (service, view) = view();
        assert_eq!(
            view.stats(),
            AnnouncementStats { total: 4, active: 4, total_views: 0 }
        );

        let first = service.store().snapshot().announcements[0].id;
        service.store().increment_views(first);
        service.store().toggle_active(first);
        assert_eq!(
            view.stats(),
            AnnouncementStats { total: 4, active: 3, total_views: 1 }
        );
        assert_eq!(view.revision(), service.store().revision());
    }

    #[tokio::test]
    async fn test_create_applies_form_defaults() {
        let (_service, view) = view();
        let created = view.create(request("  Exam week  ", "Bring your ID")).await.unwrap();

        assert!(created.notification.is_success());
        assert_eq!(created.data.title, "Exam week");
        assert_eq!(created.data.category, Category::General);
        assert_eq!(created.data.priority, Priority::Normal);
        assert_eq!(created.data.posted_by, "Admin");
        assert_eq!(created.data.posted_date, utc_date(2024, 11, 29));
        assert!(created.data.is_active);
        assert_eq!(view.list().announcements[0].id, created.data.id);
        assert_eq!(view.stats().total, 5);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields_before_store() {
        let (service, view) = view();
        let before = service.store().revision();

        let err = view.create(request("   ", "content")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = view.create(request("title", "")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(service.store().revision(), before);
        assert_eq!(service.store().len(), 4);
    }

    #[tokio::test]
    async fn test_edit_validates_supplied_fields_only() {
        let (service, view) = view();
        let id = service.store().snapshot().announcements[0].id;

        let patch = AnnouncementPatch {
            priority: Some(Priority::Urgent),
            ..Default::default()
        };
        let edited = view.edit(id, patch).await.unwrap();
        assert_eq!(edited.data.priority, Priority::Urgent);

        let blank = AnnouncementPatch {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(view.edit(id, blank).await, Err(AppError::Validation(_))));
        assert_eq!(service.store().get(id).unwrap().priority, Priority::Urgent);
    }

    #[tokio::test]
    async fn test_unknown_id_reports_not_found() {
        let (_service, view) = view();
        let unknown = Uuid::new_v4();

        assert!(matches!(view.delete(unknown).await, Err(AppError::NotFound(_))));
        assert!(matches!(view.toggle_status(unknown).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            view.edit(unknown, AnnouncementPatch::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(view.stats().total, 4);
    }

    #[tokio::test]
    async fn test_delete_and_toggle() {
        let (service, view) = view();
        let id = service.store().snapshot().announcements[1].id;

        let toggled = view.toggle_status(id).await.unwrap();
        assert!(!toggled.data.is_active);
        assert_eq!(toggled.notification.message, "Status updated");

        let deleted = view.delete(id).await.unwrap();
        assert_eq!(deleted.data, id);
        assert_eq!(view.stats().total, 3);
        assert!(view.list().announcements.iter().all(|a| a.id != id));
    }
}
