use crate::task::{TaskStore, TaskStoreError};
use axum::{
    Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tasklist_core::protocol::messages;
use tasklist_core::{Action, ApiRequest, ApiResponse, Task, TaskDraft, TaskId};

/// Failures surfaced by the task endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    #[error("Malformed request body")]
    MalformedBody(#[source] serde_json::Error),
    #[error("Invalid action")]
    InvalidAction(Option<String>),
    #[error("Invalid action")]
    MalformedQuery(#[source] QueryRejection),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Store(TaskStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(TaskStoreError::Load(_) | TaskStoreError::Storage(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!("Task request failed: {:?}", self);
        } else {
            tracing::warn!("Task request rejected: {:?}", self);
        }
        (status_code, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}

/// Query string of a read request.
#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    #[serde(default)]
    action: Option<String>,
}

/// Handler for GET /api?action=read.
#[tracing::instrument(skip(store))]
pub async fn read_handler(
    State(store): State<Arc<TaskStore>>,
    query: Result<Query<ActionQuery>, QueryRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Query(query) = query.map_err(ApiError::MalformedQuery)?;
    let request = ApiRequest {
        action: query.action,
        ..Default::default()
    };
    dispatch(&store, request).await.map(Json)
}

/// Handler for POST /api with a JSON body naming the action.
#[tracing::instrument(skip(store, body), fields(bytes = body.len()))]
pub async fn action_handler(
    State(store): State<Arc<TaskStore>>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let request: ApiRequest = serde_json::from_slice(&body).map_err(ApiError::MalformedBody)?;
    dispatch(&store, request).await.map(Json)
}

async fn dispatch(store: &TaskStore, request: ApiRequest) -> Result<ApiResponse, ApiError> {
    let action: Action = request
        .action
        .as_deref()
        .and_then(|action| action.parse().ok())
        .ok_or_else(|| ApiError::InvalidAction(request.action.clone()))?;
    tracing::debug!(%action, "Dispatching task request");

    match action {
        Action::Read => Ok(ApiResponse::listing(store.list().await)),
        Action::Create => {
            let task = request
                .task
                .ok_or_else(|| TaskStoreError::validation(messages::TASK_DATA_NOT_PROVIDED))?;
            let draft: TaskDraft = decode_task(task)?;
            let created = store.create(draft).await?;
            Ok(ApiResponse::with_task(messages::TASK_CREATED, created))
        }
        Action::Update => {
            let (Some(id), Some(task)) = (request.id, request.task) else {
                return Err(
                    TaskStoreError::validation(messages::TASK_ID_OR_DATA_NOT_PROVIDED).into(),
                );
            };
            let id = decode_id(id)?;
            let replacement: Task = decode_task(task)?;
            let updated = store.update(id, replacement).await?;
            Ok(ApiResponse::with_task(messages::TASK_UPDATED, updated))
        }
        Action::Delete => {
            let id = request
                .id
                .ok_or_else(|| TaskStoreError::validation(messages::TASK_ID_NOT_PROVIDED))?;
            store.delete(decode_id(id)?).await?;
            Ok(ApiResponse::ok(messages::TASK_DELETED))
        }
    }
}

fn decode_id(value: Value) -> Result<TaskId, TaskStoreError> {
    serde_json::from_value(value).map_err(|_| TaskStoreError::validation(messages::INVALID_TASK_ID))
}

fn decode_task<T: DeserializeOwned>(value: Value) -> Result<T, TaskStoreError> {
    serde_json::from_value(value)
        .map_err(|err| TaskStoreError::validation(format!("Invalid task data: {}", err)))
}

/// Creates and returns the task API router.
pub fn create_api_router(store: Arc<TaskStore>) -> Router {
    Router::new()
        .route("/api", get(read_handler).post(action_handler))
        .with_state(store)
}
