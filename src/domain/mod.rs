pub mod announcement;
pub mod notification;

pub use announcement::*;
pub use notification::*;
