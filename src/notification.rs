//! Notification System
//!
//! Tracks every mutation a panel sends (create, update, delete, import) from
//! pending to success or error, shows the newest one as a toast and keeps a
//! bounded history.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Level of detail for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    /// Minimal: action + entity + status icon
    Minimal,
    /// Detailed: action + entity + duration
    #[default]
    Detailed,
    /// Verbose: all info including the resource type and server message
    Verbose,
}

impl DetailLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "verbose" => Self::Verbose,
            _ => Self::Detailed,
        }
    }
}

/// Kind of mutation being performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationType {
    Create,
    Update,
    Delete,
    /// Import action, by display name
    Import(String),
}

impl OperationType {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Import(name) => name,
        }
    }

    pub fn past_tense(&self) -> &str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
            Self::Import(_) => "Imported",
        }
    }

    pub fn present_participle(&self) -> &str {
        match self {
            Self::Create => "Creating",
            Self::Update => "Updating",
            Self::Delete => "Deleting",
            Self::Import(_) => "Importing",
        }
    }
}

/// Status of a notification/operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Request sent, no answer yet
    Pending,
    Success,
    /// Failed with the user-facing error message
    Error(String),
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_))
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "↻",
            Self::Success => "✓",
            Self::Error(_) => "✗",
        }
    }
}

/// A single notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub operation_type: OperationType,
    pub resource_type: String,
    /// Natural key or id of the entity, empty for imports
    pub subject: String,
    pub status: NotificationStatus,
    /// Summary reported on success
    pub message: Option<String>,
    pub created_at: Instant,
    pub completed_at: Option<Instant>,
}

impl Notification {
    pub fn new(operation_type: OperationType, resource_type: String, subject: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation_type,
            resource_type,
            subject,
            status: NotificationStatus::Pending,
            message: None,
            created_at: Instant::now(),
            completed_at: None,
        }
    }

    pub fn set_success(&mut self, message: Option<String>) {
        self.status = NotificationStatus::Success;
        self.message = message;
        self.completed_at = Some(Instant::now());
    }

    pub fn set_error(&mut self, error: String) {
        self.status = NotificationStatus::Error(error);
        self.completed_at = Some(Instant::now());
    }

    /// Get duration of operation (or elapsed time if still running)
    pub fn duration(&self) -> Duration {
        self.completed_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.created_at)
    }

    /// Format duration for display
    pub fn duration_display(&self) -> String {
        let d = self.duration();
        if d.as_secs() < 1 {
            format!("{}ms", d.as_millis())
        } else if d.as_secs() < 60 {
            format!("{}s", d.as_secs())
        } else {
            format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
        }
    }

    fn target(&self) -> String {
        match &self.operation_type {
            OperationType::Import(name) => name.clone(),
            _ => self.subject.clone(),
        }
    }

    /// Format notification for toast display (short form)
    pub fn toast_message(&self, detail_level: DetailLevel) -> String {
        let icon = self.status.icon();
        let verb = match &self.status {
            NotificationStatus::Pending => self.operation_type.present_participle(),
            NotificationStatus::Success => self.operation_type.past_tense(),
            NotificationStatus::Error(_) => "Failed",
        };
        let target = self.target();

        match detail_level {
            DetailLevel::Minimal => format!("{} {} {}", icon, verb, target),
            DetailLevel::Detailed => match &self.status {
                NotificationStatus::Error(err) => {
                    format!("{} {} {}: {}", icon, verb, target, err)
                },
                NotificationStatus::Success => {
                    format!("{} {} {} ({})", icon, verb, target, self.duration_display())
                },
                NotificationStatus::Pending => format!("{} {} {}...", icon, verb, target),
            },
            DetailLevel::Verbose => {
                let base = format!("{} {} {} [{}]", icon, verb, target, self.resource_type);
                match &self.status {
                    NotificationStatus::Error(err) => format!("{} - {}", base, err),
                    NotificationStatus::Success => match &self.message {
                        Some(msg) => format!("{} - {} ({})", base, msg, self.duration_display()),
                        None => format!("{} ({})", base, self.duration_display()),
                    },
                    NotificationStatus::Pending => format!("{}...", base),
                }
            },
        }
    }
}

/// Notification manager
pub struct NotificationManager {
    /// All notifications (recent first)
    pub notifications: VecDeque<Notification>,
    /// Maximum notifications to keep in history
    pub max_history: usize,
    /// Toast display duration
    pub toast_duration: Duration,
    /// Detail level for display
    pub detail_level: DetailLevel,
    last_toast_time: Option<Instant>,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            notifications: VecDeque::new(),
            max_history: 50,
            toast_duration: Duration::from_secs(5),
            detail_level: DetailLevel::Detailed,
            last_toast_time: None,
        }
    }

    /// Create a new pending notification
    pub fn create_notification(
        &mut self,
        operation_type: OperationType,
        resource_type: String,
        subject: String,
    ) -> Uuid {
        let notification = Notification::new(operation_type, resource_type, subject);
        let id = notification.id;
        self.notifications.push_front(notification);
        self.last_toast_time = Some(Instant::now());
        self.trim_history();
        id
    }

    pub fn mark_success(&mut self, id: Uuid, message: Option<String>) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_success(message);
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn mark_error(&mut self, id: Uuid, error: String) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_error(error);
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// The most recent notification, while its toast is still due
    pub fn current_toast(&self) -> Option<&Notification> {
        let last_time = self.last_toast_time?;
        if last_time.elapsed() > self.toast_duration {
            return None;
        }
        self.notifications.front()
    }

    pub fn in_progress_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.status == NotificationStatus::Pending)
            .count()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.last_toast_time = None;
    }

    /// Trim history to max size, dropping the oldest finished entries first
    fn trim_history(&mut self) {
        while self.notifications.len() > self.max_history {
            if let Some(pos) = self.notifications.iter().rposition(|n| n.status.is_terminal()) {
                self.notifications.remove(pos);
            } else {
                self.notifications.pop_back();
            }
        }
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }
}
