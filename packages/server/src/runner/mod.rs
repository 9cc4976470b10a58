//! Remote code execution for coding contests.

pub mod judge0;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use judge0::Judge0Client;

/// Judge0 status id for a run whose output matched the expected output.
pub const STATUS_ACCEPTED: i32 = 3;

/// One program execution.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub language_id: i32,
    pub source_code: String,
    pub stdin: String,
    /// When set, the runner judges stdout against it.
    pub expected_output: Option<String>,
}

/// What came back from one execution.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    /// Judge0 status id (3 = Accepted, 4 = Wrong Answer, 5 = Time Limit Exceeded, ...).
    #[schema(example = 3)]
    pub status_id: i32,
    #[schema(example = "Accepted")]
    pub status: String,
    /// Wall time in seconds, as reported by the runner.
    pub time: Option<String>,
    /// Peak memory in kilobytes.
    pub memory: Option<i64>,
}

impl RunOutcome {
    pub fn is_accepted(&self) -> bool {
        self.status_id == STATUS_ACCEPTED
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to reach code runner: {0}")]
    Request(#[from] reqwest::Error),
    #[error("code runner answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Executes untrusted code somewhere else.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunnerError>;
}
