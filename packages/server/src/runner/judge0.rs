use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{CodeRunner, RunOutcome, RunRequest, RunnerError};
use crate::config::Judge0Config;

/// Client for a Judge0 instance (self-hosted or behind RapidAPI).
pub struct Judge0Client {
    client: Client,
    submissions_url: String,
    api_key: Option<String>,
    api_host: Option<String>,
}

#[derive(Serialize)]
struct SubmissionBody<'a> {
    source_code: &'a str,
    language_id: i32,
    stdin: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_output: Option<&'a str>,
}

#[derive(Deserialize)]
struct SubmissionStatus {
    id: i32,
    description: String,
}

#[derive(Deserialize)]
struct SubmissionResult {
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    status: SubmissionStatus,
    time: Option<String>,
    memory: Option<i64>,
}

impl From<SubmissionResult> for RunOutcome {
    fn from(r: SubmissionResult) -> Self {
        Self {
            stdout: r.stdout,
            stderr: r.stderr,
            compile_output: r.compile_output,
            status_id: r.status.id,
            status: r.status.description,
            time: r.time,
            memory: r.memory,
        }
    }
}

impl Judge0Client {
    pub fn new(config: &Judge0Config) -> Result<Self, RunnerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            submissions_url: format!(
                "{}/submissions?base64_encoded=false&wait=true",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            api_host: config.api_host.clone(),
        })
    }
}

#[async_trait]
impl CodeRunner for Judge0Client {
    #[instrument(skip(self, request), fields(language_id = request.language_id))]
    async fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunnerError> {
        let body = SubmissionBody {
            source_code: &request.source_code,
            language_id: request.language_id,
            stdin: &request.stdin,
            expected_output: request.expected_output.as_deref(),
        };

        let mut req = self.client.post(&self.submissions_url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("X-RapidAPI-Key", key);
        }
        if let Some(host) = &self.api_host {
            req = req.header("X-RapidAPI-Host", host);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RunnerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: SubmissionResult = response.json().await?;
        tracing::debug!(status = %result.status.description, "Judge0 run finished");
        Ok(result.into())
    }
}
