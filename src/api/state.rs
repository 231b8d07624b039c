use std::sync::Arc;
use crate::{
    config::Settings,
    service::ServiceContext,
    web::{AdminAnnouncementsView, PortalAnnouncementsView},
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub admin_announcements: Arc<AdminAnnouncementsView>,
    pub portal_announcements: Arc<PortalAnnouncementsView>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Self {
        let admin_announcements = Arc::new(AdminAnnouncementsView::new(
            service_context.announcement_service.clone(),
            service_context.clock.clone(),
            &settings.announcements,
        ));
        let portal_announcements = Arc::new(PortalAnnouncementsView::new(
            service_context.announcement_service.clone(),
            service_context.clock.clone(),
        ));

        Self {
            service_context,
            admin_announcements,
            portal_announcements,
            settings,
        }
    }
}
