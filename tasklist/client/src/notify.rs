use std::fmt;

pub mod messages {
    pub const EMPTY_INPUT: &str = "Please enter a task";
    pub const TASK_ADDED: &str = "Task added successfully";
    pub const TASK_COMPLETED: &str = "Task completed ✓";
    pub const TASK_PENDING: &str = "Task marked as pending";
    pub const TASK_EDITED: &str = "Task updated";
    pub const TASK_DELETED: &str = "Task deleted";
    pub const LOAD_FAILED: &str = "Failed to load tasks";
    pub const ADD_FAILED: &str = "Failed to add task";
    pub const UPDATE_FAILED: &str = "Failed to update task";
    pub const DELETE_FAILED: &str = "Failed to delete task";
    pub const CONNECTION_ERROR: &str = "Connection error";
    pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";
    pub const DELETE_CANCELLED: &str = "Task kept";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        };
        f.write_str(label)
    }
}

/// A short-lived message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Delivers notifications to the user.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Asks the user to confirm a destructive action.
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmationGate {
    fn confirm(&self, prompt: &str) -> bool;
}
