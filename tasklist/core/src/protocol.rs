//! Request and response envelopes exchanged with the task endpoint.
//!
//! Every request names an `action`. Reads arrive as `GET ?action=read`; mutations
//! arrive as a JSON body carrying the action and its operands. Every response
//! carries `success`, and failures add a human-readable `message`.
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod messages {
    pub const TASK_CREATED: &str = "Task created successfully";
    pub const TASK_UPDATED: &str = "Task updated successfully";
    pub const TASK_DELETED: &str = "Task deleted successfully";
    pub const TASK_DATA_NOT_PROVIDED: &str = "Task data not provided";
    pub const TASK_ID_OR_DATA_NOT_PROVIDED: &str = "Task id or data not provided";
    pub const TASK_ID_NOT_PROVIDED: &str = "Task id not provided";
    pub const TASK_TEXT_EMPTY: &str = "Task text cannot be empty";
    pub const INVALID_TASK_ID: &str = "Invalid task id";
    pub const TASK_ID_OUT_OF_RANGE: &str = "Task id out of range";
    pub const TASK_NOT_FOUND: &str = "Task not found";
    pub const LOAD_FAILED: &str = "Failed to load tasks";
    pub const SAVE_FAILED: &str = "Failed to save tasks";
    pub const MALFORMED_BODY: &str = "Malformed request body";
    pub const INVALID_ACTION: &str = "Invalid action";
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown action '{0}'")]
pub struct UnknownAction(pub String);

/// Operation selected by a request's `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Request as received by the server.
///
/// Operands stay untyped so a missing or malformed field is reported as a
/// validation failure of that field rather than as an unreadable body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub task: Option<Value>,
}

impl ApiRequest {
    pub fn for_action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }
}

/// Request as sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRequest<'a> {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<&'a Task>,
}

impl<'a> ActionRequest<'a> {
    pub fn create(task: &'a Task) -> Self {
        Self {
            action: Action::Create,
            id: None,
            task: Some(task),
        }
    }

    pub fn update(id: TaskId, task: &'a Task) -> Self {
        Self {
            action: Action::Update,
            id: Some(id),
            task: Some(task),
        }
    }

    pub fn delete(id: TaskId) -> Self {
        Self {
            action: Action::Delete,
            id: Some(id),
            task: None,
        }
    }
}

/// Response envelope shared by every action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

impl ApiResponse {
    /// Successful read of the whole collection.
    pub fn listing(tasks: Vec<Task>) -> Self {
        Self {
            success: true,
            message: None,
            task: None,
            tasks: Some(tasks),
        }
    }

    /// Successful mutation that echoes the affected record.
    pub fn with_task(message: impl Into<String>, task: Task) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            task: Some(task),
            tasks: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            task: None,
            tasks: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            task: None,
            tasks: None,
        }
    }
}
