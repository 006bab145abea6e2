//! Client for the remote task store.
//!
//! The planner has one external collaborator: an authenticated HTTP task
//! store with a narrow contract (bulk fetch, create, partial update,
//! delete). Every call is a best-effort side effect of a local mutation;
//! the in-memory index stays the source of truth between syncs, and a
//! failed call leaves it untouched. The planner never retries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Task;

/// Failure talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The call never got a response.
    #[error("remote store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// The store answered outside the 2xx range.
    #[error("remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Partial update for an existing remote task. Only set fields are sent.
#[derive(Serialize, Debug, Default)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// The remote task store contract.
pub trait TaskService {
    /// Bulk read of every task, used to seed or refresh the local index.
    fn fetch_all(&self) -> Result<Vec<Task>, RemoteError>;

    /// Creates a task and returns the canonical record the store assigned.
    /// It may differ from the draft, e.g. a server-assigned id.
    fn create(&self, draft: &Task) -> Result<Task, RemoteError>;

    /// Applies a partial update and returns the updated record.
    fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, RemoteError>;

    /// Deletes a task.
    fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// Error body shape the store uses for rejections.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Blocking HTTP client for the task store API.
pub struct HttpTaskService {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl HttpTaskService {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Builds a client from `DAYBOOK_API_URL` and `DAYBOOK_API_TOKEN`.
    ///
    /// Returns `None` when no URL is configured; commands then run purely
    /// locally.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("DAYBOOK_API_URL").ok()?;
        let token = std::env::var("DAYBOOK_API_TOKEN").unwrap_or_default();
        Some(Self::new(base_url, token))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-2xx response into [`RemoteError::Rejected`], decoding the
    /// store's `{"message": ...}` body when there is one.
    fn check(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .map(|body| body.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl TaskService for HttpTaskService {
    fn fetch_all(&self) -> Result<Vec<Task>, RemoteError> {
        let response = self
            .client
            .get(self.url("/tasks"))
            .bearer_auth(&self.token)
            .send()?;
        Ok(Self::check(response)?.json()?)
    }

    fn create(&self, draft: &Task) -> Result<Task, RemoteError> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .bearer_auth(&self.token)
            .json(draft)
            .send()?;
        Ok(Self::check(response)?.json()?)
    }

    fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, RemoteError> {
        let response = self
            .client
            .patch(self.url(&format!("/tasks/{id}")))
            .bearer_auth(&self.token)
            .json(patch)
            .send()?;
        Ok(Self::check(response)?.json()?)
    }

    fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{id}")))
            .bearer_auth(&self.token)
            .send()?;
        Self::check(response)?;
        Ok(())
    }
}
