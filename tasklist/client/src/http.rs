use crate::api::{ApiError, TaskApi};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use tasklist_core::{Action, ActionRequest, ApiResponse, Task, TaskId};

/// Talks to the task endpoint over HTTP.
///
/// Error statuses are not treated as transport failures: the store answers
/// refusals with an error status and a JSON body, and that body decides between
/// success and refusal.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTaskApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if body.success {
            Ok(body)
        } else {
            tracing::debug!(%status, "Task store refused request");
            Err(ApiError::Rejected(
                body.message
                    .unwrap_or_else(|| format!("Request failed with status {}", status)),
            ))
        }
    }

    async fn post(&self, request: &ActionRequest<'_>) -> Result<ApiResponse, ApiError> {
        self.send(self.client.post(&self.endpoint).json(request))
            .await
    }
}

fn malformed(field: &str) -> ApiError {
    ApiError::Transport(format!("Malformed response: missing '{}'", field))
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("action", Action::Read.as_str())]);
        self.send(request).await?.tasks.ok_or_else(|| malformed("tasks"))
    }

    #[tracing::instrument(skip(self, task), fields(endpoint = %self.endpoint, id = %task.id))]
    async fn create(&self, task: &Task) -> Result<Task, ApiError> {
        self.post(&ActionRequest::create(task))
            .await?
            .task
            .ok_or_else(|| malformed("task"))
    }

    #[tracing::instrument(skip(self, task), fields(endpoint = %self.endpoint))]
    async fn update(&self, id: TaskId, task: &Task) -> Result<Task, ApiError> {
        self.post(&ActionRequest::update(id, task))
            .await?
            .task
            .ok_or_else(|| malformed("task"))
    }

    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        self.post(&ActionRequest::delete(id)).await?;
        Ok(())
    }
}
