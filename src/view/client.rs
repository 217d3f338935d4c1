//! Client side of the task API.
//!
//! [`TaskApi`] is the seam between the view and the network. The view only
//! ever sees a `Result`: any transport failure, timeout or non-success
//! status is an `Err` and triggers rollback.

use async_trait::async_trait;
use reqwest::Response;
use thiserror::Error;

use crate::api::{ApiError, TaskResponse};
use crate::domain::{Priority, Stats, Task, TaskId, TaskPatch, TaskStatus};
use crate::infrastructure::{ClientConfig, ConfigurationError};

// =============================================================================
// Client Error
// =============================================================================

/// Errors returned by a [`TaskApi`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection, timeout, decoding).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server responded {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the body, or the status reason.
        message: String,
    },

    /// The server returned a task that violates the task invariants.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl ClientError {
    /// Returns the HTTP status if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// Task API Trait
// =============================================================================

/// Operations the view needs from the task service.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET /tasks`, optionally filtered.
    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, ClientError>;

    /// `POST /tasks`.
    async fn create_task(
        &self,
        title: &str,
        priority: Option<Priority>,
    ) -> Result<Task, ClientError>;

    /// `PATCH /tasks/{id}`.
    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ClientError>;

    /// `DELETE /tasks/{id}`.
    async fn delete_task(&self, id: &TaskId) -> Result<(), ClientError>;

    /// `GET /stats`.
    async fn stats(&self) -> Result<Stats, ClientError>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`TaskApi`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// Creates a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Creates a client from `TASKBOARD_API_URL` / `TASKBOARD_API_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` for invalid settings.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&ClientConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Turns a non-success response into `ClientError::Status`.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiError>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

fn into_task(response: TaskResponse) -> Result<Task, ClientError> {
    let id = response.id;
    Task::try_from(response)
        .map_err(|error| ClientError::InvalidResponse(format!("task {id}: {error}")))
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, ClientError> {
        let mut request = self.http.get(self.url("/tasks"));
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }

        let response = check_status(request.send().await?).await?;
        response
            .json::<Vec<TaskResponse>>()
            .await?
            .into_iter()
            .map(into_task)
            .collect()
    }

    async fn create_task(
        &self,
        title: &str,
        priority: Option<Priority>,
    ) -> Result<Task, ClientError> {
        let mut body = serde_json::json!({ "title": title });
        if let Some(priority) = priority {
            body["priority"] = serde_json::Value::from(priority.as_str());
        }

        let response = self.http.post(self.url("/tasks")).json(&body).send().await?;
        into_task(check_status(response).await?.json().await?)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/tasks/{id}")))
            .json(patch)
            .send()
            .await?;
        into_task(check_status(response).await?.json().await?)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<Stats, ClientError> {
        let response = self.http.get(self.url("/stats")).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}
