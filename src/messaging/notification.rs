// Transient user-facing notices (device failures, unknown sounds, ...)

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Subsystem that raised the notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Audio,
    Catalog,
    Timeline,
    Generic,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        category: NotificationCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            timestamp: now_ms(),
        }
    }

    pub fn info(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// True while the notice is younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        now_ms().saturating_sub(self.timestamp) < max_age_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let notif = Notification::error(NotificationCategory::Catalog, "Unknown sound: x");

        assert_eq!(notif.level, NotificationLevel::Error);
        assert_eq!(notif.category, NotificationCategory::Catalog);
        assert_eq!(notif.message, "Unknown sound: x");
        assert!(notif.timestamp > 0);
    }

    #[test]
    fn test_notification_helpers() {
        let info = Notification::info(NotificationCategory::Audio, "Info");
        let warning =
            Notification::warning(NotificationCategory::Timeline, String::from("Warning"));
        let error = Notification::error(NotificationCategory::Generic, "Error");

        assert_eq!(info.level, NotificationLevel::Info);
        assert_eq!(warning.level, NotificationLevel::Warning);
        assert_eq!(error.level, NotificationLevel::Error);
    }

    #[test]
    fn test_notification_is_recent() {
        let mut notif = Notification::info(NotificationCategory::Generic, "Test");
        assert!(notif.is_recent(10_000));

        notif.timestamp = 0;
        assert!(!notif.is_recent(1000));
    }
}
