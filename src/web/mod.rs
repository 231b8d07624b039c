//! Audience-specific views over the announcement store.

pub mod portal;

pub use portal::{
    admin::{AdminAnnouncementList, AdminAnnouncementsView, CreateAnnouncementRequest},
    AnnouncementDetails, PortalAnnouncementsView,
};
