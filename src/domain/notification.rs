use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 2000;

/// Transient message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub color: NotificationColor,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationColor {
    Success,
    Warning,
    Danger,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationColor::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationColor::Warning)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(message, NotificationColor::Danger)
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.color == NotificationColor::Success
    }

    fn new(message: impl Into<String>, color: NotificationColor) -> Self {
        Self {
            message: message.into(),
            color,
            duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
        }
    }
}

/// A value produced by a view action together with the confirmation to show.
#[derive(Debug, Clone, Serialize)]
pub struct Notified<T> {
    pub data: T,
    pub notification: Notification,
}

impl<T> Notified<T> {
    pub fn new(data: T, notification: Notification) -> Self {
        Self { data, notification }
    }
}
