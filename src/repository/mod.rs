use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod announcement_store;
pub mod announcement_repository;

pub use announcement_store::{AnnouncementStore, Snapshot, Subscription};
pub use announcement_repository::SqliteAnnouncementRepository;

/// Durable copy of the announcement collection. The in-memory store stays
/// canonical; this is read once at startup and written after each mutation.
#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Announcement>>;
    async fn save(&self, announcement: &Announcement) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}
