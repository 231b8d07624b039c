pub mod announcement_service;
pub mod clock;

use std::sync::Arc;
use sqlx::SqlitePool;

pub use announcement_service::AnnouncementService;
pub use clock::{Clock, FixedClock, SystemClock};

pub struct ServiceContext {
    pub announcement_service: Arc<AnnouncementService>,
    pub clock: Arc<dyn Clock>,
    pub db_pool: Option<SqlitePool>,
}

impl ServiceContext {
    pub fn new(
        announcement_service: Arc<AnnouncementService>,
        clock: Arc<dyn Clock>,
        db_pool: Option<SqlitePool>,
    ) -> Self {
        Self {
            announcement_service,
            clock,
            db_pool,
        }
    }
}
