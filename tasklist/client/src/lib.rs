//! Client side of the task list: a local mirror of the server's collection that
//! applies changes optimistically and rolls them back when the server refuses.
pub mod api;
pub mod cli;
pub mod controller;
pub mod http;
pub mod notify;

pub use api::{ApiError, TaskApi};
pub use controller::{Outcome, TaskClient};
pub use http::HttpTaskApi;
pub use notify::{ConfirmationGate, Notification, NotificationKind, Notifier};
