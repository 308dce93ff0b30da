//! Abstraction over the remote task store.
//!
//! The controller only sees this trait, so the transport can be swapped for a
//! mock in tests or for another protocol without touching the optimistic logic.
use async_trait::async_trait;
use tasklist_core::{Task, TaskId};
use thiserror::Error;

/// Errors that can occur while talking to the task store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The store answered but refused the request.
    #[error("{0}")]
    Rejected(String),
    /// The request never got a readable answer.
    #[error("Connection error: {0}")]
    Transport(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Fetches the whole collection.
    async fn list(&self) -> Result<Vec<Task>, ApiError>;

    /// Stores a new task and returns it as the store kept it.
    async fn create(&self, task: &Task) -> Result<Task, ApiError>;

    /// Replaces the task stored under `id`.
    async fn update(&self, id: TaskId, task: &Task) -> Result<Task, ApiError>;

    async fn delete(&self, id: TaskId) -> Result<(), ApiError>;
}
