pub mod announcements;

pub use announcements::{AdminAnnouncementList, AdminAnnouncementsView, CreateAnnouncementRequest};
