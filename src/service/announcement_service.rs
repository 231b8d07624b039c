use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    domain::{demo_board, Announcement, AnnouncementInput, AnnouncementPatch},
    error::Result,
    repository::{AnnouncementRepository, AnnouncementStore},
};

/// The announcement store plus its optional persistence collaborator.
///
/// The store is always updated first; persistence follows and its failure
/// does not undo the in-memory change. Each mutation holds `writes` until
/// its repository call returns, so storage sees changes in mutation order.
pub struct AnnouncementService {
    store: Arc<AnnouncementStore>,
    repo: Option<Arc<dyn AnnouncementRepository>>,
    writes: Mutex<()>,
}

impl AnnouncementService {
    pub fn new(store: Arc<AnnouncementStore>, repo: Option<Arc<dyn AnnouncementRepository>>) -> Self {
        Self {
            store,
            repo,
            writes: Mutex::new(()),
        }
    }

    pub fn in_memory(store: Arc<AnnouncementStore>) -> Self {
        Self::new(store, None)
    }

    /// Build the store from persistence, falling back to the demo data when
    /// nothing is stored yet.
    pub async fn bootstrap(
        repo: Option<Arc<dyn AnnouncementRepository>>,
        seed_demo_data: bool,
    ) -> Result<Self> {
        let loaded = match &repo {
            Some(repo) => repo.load_all().await?,
            None => Vec::new(),
        };

        if !loaded.is_empty() {
            tracing::info!("Loaded {} announcements from storage", loaded.len());
            let store = Arc::new(AnnouncementStore::from_announcements(loaded));
            return Ok(Self::new(store, repo));
        }

        if !seed_demo_data {
            return Ok(Self::new(Arc::new(AnnouncementStore::new()), repo));
        }

        let store = Arc::new(AnnouncementStore::from_announcements(demo_board()));
        if let Some(repo) = &repo {
            // Oldest insert last so load order matches the seeded order.
            for announcement in store.snapshot().announcements.iter().rev() {
                repo.save(announcement).await?;
            }
        }
        tracing::info!("Loaded {} demo announcements", store.len());
        Ok(Self::new(store, repo))
    }

    pub fn store(&self) -> &Arc<AnnouncementStore> {
        &self.store
    }

    pub fn is_persistent(&self) -> bool {
        self.repo.is_some()
    }

    async fn persist(&self, announcement: &Announcement) -> Result<()> {
        if let Some(repo) = &self.repo {
            if let Err(e) = repo.save(announcement).await {
                tracing::warn!("Failed to persist announcement {}: {}", announcement.id, e);
                return Err(e);
            }
        }
        Ok(())
    }

    pub async fn add(&self, input: AnnouncementInput) -> Result<Announcement> {
        let _write = self.writes.lock().await;
        let announcement = self.store.add(input);
        self.persist(&announcement).await?;
        Ok(announcement)
    }

    pub async fn update(&self, id: Uuid, patch: AnnouncementPatch) -> Result<Option<Announcement>> {
        let _write = self.writes.lock().await;
        if !self.store.update(id, patch) {
            return Ok(None);
        }
        self.persist_current(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let _write = self.writes.lock().await;
        let removed = self.store.delete(id);
        if removed {
            if let Some(repo) = &self.repo {
                if let Err(e) = repo.delete(id).await {
                    tracing::warn!("Failed to delete announcement {} from storage: {}", id, e);
                    return Err(e);
                }
            }
        }
        Ok(removed)
    }

    pub async fn toggle_active(&self, id: Uuid) -> Result<Option<Announcement>> {
        let _write = self.writes.lock().await;
        if self.store.toggle_active(id).is_none() {
            return Ok(None);
        }
        self.persist_current(id).await
    }

    pub async fn increment_views(&self, id: Uuid) -> Result<Option<Announcement>> {
        let _write = self.writes.lock().await;
        if self.store.increment_views(id).is_none() {
            return Ok(None);
        }
        self.persist_current(id).await
    }

    async fn persist_current(&self, id: Uuid) -> Result<Option<Announcement>> {
        let Some(current) = self.store.get(id) else {
            return Ok(None);
        };
        self.persist(&current).await?;
        Ok(Some(current))
    }
}
