pub mod admin;
pub mod announcements;

pub use announcements::{AnnouncementDetails, PortalAnnouncementsView};
