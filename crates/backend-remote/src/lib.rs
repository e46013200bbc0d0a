//! Remote AI scoring backend.
//!
//! Provides the `RemoteScorer` trait and its HTTP implementation. The batch
//! orchestrator only sees the trait, so the service can be swapped or faked
//! without touching scoring logic.

use reqwest::multipart::{Form, Part};
use skillmatch_model::{RemoteMatchOutcome, WireMatchResponse, WireMatchResult};
use skillmatch_request::{JobDescription, ResumeSubmission};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors from remote scoring calls.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RemoteError {
    /// The service could not be reached at all.
    #[error("Scoring service unreachable: {0}")]
    Unreachable(String),

    #[error("Scoring request timed out: {0}")]
    Timeout(String),

    #[error("Scoring service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode scoring response: {0}")]
    Decode(String),

    #[error("Scoring response contained no result for {0}")]
    MissingResult(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl RemoteError {
    /// Whether this error means no résumé in the batch can be scored.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Client(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Unreachable(e.to_string())
        } else if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Trait for remote scoring services.
pub trait RemoteScorer {
    /// Score one résumé against the job.
    fn score(
        &self,
        job: &JobDescription,
        resume: &ResumeSubmission,
    ) -> impl Future<Output = Result<RemoteMatchOutcome, RemoteError>> + Send;

    /// Check if the service is healthy.
    fn health_check(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Get the backend name for logging.
    fn name(&self) -> &'static str;
}

/// Remote scoring service configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the scoring service
    pub base_url: String,
    /// Path of the match endpoint
    pub match_path: String,
    /// Path of the health endpoint
    pub health_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            match_path: "/match".to_string(),
            health_path: "/health".to_string(),
            timeout_secs: 60,
        }
    }
}

impl RemoteConfig {
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// HTTP scoring backend. Sends one résumé per request as multipart form data.
pub struct HttpScorer {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl HttpScorer {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Use a preconfigured client (custom TLS, proxies, default headers).
    pub fn with_client(config: RemoteConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn build_form(job: &JobDescription, resume: &ResumeSubmission) -> Form {
        let mut form = Form::new();

        if let Some(text) = job.manual_text() {
            form = form.text("job_description", text.to_string());
        }

        if let Some(file) = &job.file {
            form = form.part(
                "job_requirement_file",
                Part::bytes(file.content.clone()).file_name(file.filename.clone()),
            );
        }

        form.part(
            "resumes",
            Part::bytes(resume.file.content.clone()).file_name(resume.file.filename.clone()),
        )
    }
}

/// Pick the result for `filename` out of a response.
///
/// Falls back to the only result when the service renamed the file.
pub fn select_result(response: WireMatchResponse, filename: &str) -> Result<WireMatchResult, RemoteError> {
    let mut results = response.resumes;

    if let Some(pos) = results.iter().position(|r| r.filename == filename) {
        return Ok(results.swap_remove(pos));
    }

    if results.len() == 1 {
        let mut only = results.remove(0);
        tracing::debug!(expected = filename, got = %only.filename, "Remote result filename differs");
        only.filename = filename.to_string();
        return Ok(only);
    }

    Err(RemoteError::MissingResult(filename.to_string()))
}

impl RemoteScorer for HttpScorer {
    async fn score(
        &self,
        job: &JobDescription,
        resume: &ResumeSubmission,
    ) -> Result<RemoteMatchOutcome, RemoteError> {
        let url = self.config.url(&self.config.match_path);

        tracing::debug!(url = %url, resume = resume.filename(), "Requesting remote match score");

        let response = self
            .client
            .post(&url)
            .multipart(Self::build_form(job, resume))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let body: WireMatchResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        let result = select_result(body, resume.filename())?;
        Ok(RemoteMatchOutcome::from(result))
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        let response = self
            .client
            .get(self.config.url(&self.config.health_path))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status {
                status: response.status().as_u16(),
                body: String::new(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
