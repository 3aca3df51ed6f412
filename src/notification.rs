use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: Instant,
    /// `None` for blocking notifications, which stay until dismissed
    pub expires_at: Option<Instant>,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel, duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            message: message.into(),
            level,
            created_at: now,
            expires_at: Some(now + duration),
        }
    }

    /// A notification that must be acknowledged by the user
    pub fn blocking(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            expires_at: None,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    pub fn time_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
    }
}

#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
    default_duration: Duration,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::with_default_duration(Duration::from_secs(5))
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            notifications: Vec::new(),
            default_duration,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        let notification = Notification::new(message, level, self.default_duration);
        self.show(notification);
    }

    pub fn show(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Warning);
    }

    /// Show an error that blocks input until dismissed
    pub fn error_blocking(&mut self, message: impl Into<String>) {
        self.show(Notification::blocking(message, NotificationLevel::Error));
    }

    /// Remove expired notifications, returns true if any were removed
    pub fn update(&mut self) -> bool {
        let initial_len = self.notifications.len();
        self.notifications.retain(|n| !n.is_expired());
        self.notifications.len() != initial_len
    }

    /// The most recent notification
    pub fn current(&self) -> Option<&Notification> {
        self.notifications.first()
    }

    /// The most recent blocking notification, if any is waiting
    pub fn blocking(&self) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.is_blocking())
    }

    pub fn dismiss_current(&mut self) -> bool {
        if self.notifications.is_empty() {
            false
        } else {
            self.notifications.remove(0);
            true
        }
    }

    /// Dismiss the most recent blocking notification
    pub fn dismiss_blocking(&mut self) -> bool {
        match self.notifications.iter().position(Notification::is_blocking) {
            Some(index) => {
                self.notifications.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    pub fn count(&self) -> usize {
        self.notifications.len()
    }
}
