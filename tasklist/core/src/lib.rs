//! Shared task model and wire protocol for the task list server and client.
pub mod protocol;
pub mod task;

pub use protocol::{Action, ActionRequest, ApiRequest, ApiResponse};
pub use task::{Filter, InvalidTaskId, Stats, Task, TaskDraft, TaskId, UnknownFilter};
