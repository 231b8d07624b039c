use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::{self, Announcement, Category, CategoryFilter},
    error::{AppError, Result},
    repository::Subscription,
    service::{clock::Clock, AnnouncementService},
};

/// Full content shown when a student opens an announcement.
#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementDetails {
    pub header: String,
    pub sub_header: String,
    pub announcement: Announcement,
}

impl AnnouncementDetails {
    fn new(announcement: Announcement) -> Self {
        Self {
            header: announcement.title.clone(),
            sub_header: format!(
                "Posted by {} on {}",
                announcement.posted_by,
                announcement.posted_date.format("%B %-d, %Y")
            ),
            announcement,
        }
    }
}

struct PortalViewState {
    latest: Arc<[Announcement]>,
    active: Vec<Announcement>,
}

/// Student/public view: only active, unexpired announcements in priority
/// order.
pub struct PortalAnnouncementsView {
    service: Arc<AnnouncementService>,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<PortalViewState>>,
    _subscription: Subscription,
}

impl PortalAnnouncementsView {
    pub fn new(service: Arc<AnnouncementService>, clock: Arc<dyn Clock>) -> Self {
        let state = Arc::new(RwLock::new(PortalViewState {
            latest: Vec::<Announcement>::new().into(),
            active: Vec::new(),
        }));

        let sink = state.clone();
        let push_clock = clock.clone();
        let subscription = service.store().subscribe(move |snapshot| {
            let active = domain::active_sorted(&snapshot.announcements, push_clock.now());
            let mut view = sink.write().unwrap_or_else(PoisonError::into_inner);
            tracing::debug!("Portal view derived {} active announcements", active.len());
            view.latest = snapshot.announcements.clone();
            view.active = active;
        });

        Self {
            service,
            clock,
            state,
            _subscription: subscription,
        }
    }

    /// Re-derive the active set against the current time, dropping anything
    /// that expired since the last push.
    pub fn refresh(&self) {
        let mut view = self.state.write().unwrap_or_else(PoisonError::into_inner);
        view.active = domain::active_sorted(&view.latest, self.clock.now());
    }

    pub fn list(&self, filter: CategoryFilter) -> Vec<Announcement> {
        let view = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let filtered: Vec<Announcement> = view
            .active
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        tracing::debug!("Filtered to {} announcements", filtered.len());
        filtered
    }

    pub fn by_category(&self, category: Category) -> Vec<Announcement> {
        self.service.store().by_category(category)
    }

    /// Counts one view per call, then returns the full content.
    pub async fn view_details(&self, id: Uuid) -> Result<AnnouncementDetails> {
        let announcement = self
            .service
            .increment_views(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;
        Ok(AnnouncementDetails::new(announcement))
    }
}
