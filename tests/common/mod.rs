//! Common test helpers for integration tests.
//!
//! The `#![allow(dead_code)]` attribute is necessary because each integration
//! test file is compiled as a separate crate and uses only part of this module.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use taskboard::api::{ApiErrorResponse, AppState, create_router};
use taskboard::application::{ServiceError, TaskService};
use taskboard::domain::{Priority, Stats, Task, TaskId, TaskPatch, TaskStatus};
use taskboard::infrastructure::{ClientConfig, InMemoryTaskStore};
use taskboard::view::{ClientError, HttpTaskApi, TaskApi};

// =============================================================================
// Router Helpers
// =============================================================================

/// Creates a service over an empty in-memory store.
pub fn create_test_service() -> TaskService {
    TaskService::new(Arc::new(InMemoryTaskStore::new()))
}

/// Creates a router sharing the given service.
pub fn create_test_app(service: &TaskService) -> Router {
    create_router(AppState::new(service.clone()))
}

/// Sends one request through the router and decodes the JSON body.
///
/// Empty bodies decode to `Value::Null`.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request
        .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// =============================================================================
// In-Process Task API
// =============================================================================

/// [`TaskApi`] that calls the service directly, with switchable failures.
///
/// Failures are reported the way the HTTP layer would report them.
pub struct InProcessApi {
    service: TaskService,
    fail: AtomicBool,
}

impl InProcessApi {
    pub fn new(service: TaskService) -> Self {
        Self {
            service,
            fail: AtomicBool::new(false),
        }
    }

    /// Makes every following call fail with a 500 (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    fn injected(&self) -> Result<(), ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                message: "Internal server error.".to_string(),
            });
        }
        Ok(())
    }
}

fn to_client_error(error: ServiceError) -> ClientError {
    let response = ApiErrorResponse::from(error);
    ClientError::Status {
        status: response.status.as_u16(),
        message: response.error.error,
    }
}

#[async_trait]
impl TaskApi for InProcessApi {
    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, ClientError> {
        self.injected()?;
        self.service
            .list(status.map(TaskStatus::as_str))
            .await
            .map_err(to_client_error)
    }

    async fn create_task(
        &self,
        title: &str,
        priority: Option<Priority>,
    ) -> Result<Task, ClientError> {
        self.injected()?;
        self.service
            .create(title, priority)
            .await
            .map_err(to_client_error)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
        self.injected()?;
        self.service
            .update(id, patch)
            .await
            .map_err(to_client_error)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ClientError> {
        self.injected()?;
        self.service.delete(id).await.map_err(to_client_error)
    }

    async fn stats(&self) -> Result<Stats, ClientError> {
        self.injected()?;
        self.service.stats().await.map_err(to_client_error)
    }
}

// =============================================================================
// Live Server
// =============================================================================

/// Serves a fresh router on an ephemeral local port.
pub async fn spawn_server(service: &TaskService) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = create_test_app(service);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    address
}

/// HTTP client pointed at a spawned server.
pub fn http_client(address: SocketAddr) -> HttpTaskApi {
    HttpTaskApi::new(&ClientConfig::new(format!("http://{address}"))).unwrap()
}
