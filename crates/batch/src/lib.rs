//! Batch match orchestration.
//!
//! Drives one analysis session: validates the request, then scores each
//! résumé in the order it was added, one at a time, reconciling the remote
//! result with the local estimate. The queue is drained strictly front to
//! back, so result order always equals input order.
//!
//! ```text
//! Idle -> Validating -> Analyzing -> Completed
//!                    \-> Rejected   \-> Failed
//! ```

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use skillmatch_backend_remote::{RemoteError, RemoteScorer};
use skillmatch_model::{MatchScore, RemoteMatchOutcome};
use skillmatch_report::{render_report, summarize, ReportEntry, ReportSummary};
use skillmatch_request::{AnalysisRequest, JobDescription, RequestError, ResumeSubmission};
use skillmatch_scoring::{compute_local, reconcile, ResolvedJob, ResolvedProfile};
use skillmatch_taxonomy::TaxonomyIndex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Orchestrator configuration.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Maximum résumés per batch. `None` means unbounded.
    pub max_resumes: Option<usize>,
}

/// Where the current session is.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchState {
    Idle,
    Validating,
    Analyzing { completed: usize, total: usize },
    Completed,
    Rejected(RequestError),
    Failed(String),
}

impl BatchState {
    /// Whether the session has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected(_) | Self::Failed(_))
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::Analyzing { completed, total } => write!(f, "analyzing ({completed}/{total})"),
            Self::Completed => f.write_str("completed"),
            Self::Rejected(e) => write!(f, "rejected: {e}"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// One résumé's reconciled result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Position in the submitted résumé list
    pub index: usize,
    pub filename: String,
    pub score: MatchScore,
}

/// Cancels an analysis session from outside the orchestrator.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // No receivers left means the session already ended.
        let _ = self.tx.send(true);
    }
}

/// Observed by a running session.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn channel() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelToken { rx })
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_, token) = Self::channel();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Pends forever if the handle was dropped.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

const EMPTY_RESUME_ERROR: &str = "Resume file is empty";

/// Outcome of one queued résumé.
enum Step {
    Scored(BatchItem),
    Cancelled,
    Unreachable(RemoteError),
}

/// Runs analysis sessions for one job against its résumés.
pub struct BatchOrchestrator<S> {
    scorer: Option<S>,
    taxonomy: Arc<TaxonomyIndex>,
    config: BatchConfig,
    state: BatchState,
    job: Option<JobDescription>,
    results: Vec<BatchItem>,
    session: u64,
}

impl<S: RemoteScorer> BatchOrchestrator<S> {
    /// Without a scorer every résumé gets the local estimate.
    pub fn new(scorer: Option<S>, taxonomy: Arc<TaxonomyIndex>, config: BatchConfig) -> Self {
        Self {
            scorer,
            taxonomy,
            config,
            state: BatchState::Idle,
            job: None,
            results: Vec::new(),
            session: 0,
        }
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    /// Results of the current session, in input order.
    pub fn results(&self) -> &[BatchItem] {
        &self.results
    }

    /// Sequence number of the current session.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Swap in a rebuilt taxonomy. Takes effect from the next session.
    pub fn replace_taxonomy(&mut self, taxonomy: Arc<TaxonomyIndex>) {
        self.taxonomy = taxonomy;
    }

    /// Drop all session state and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = BatchState::Idle;
        self.job = None;
        self.results.clear();
    }

    /// Run a session to completion.
    pub async fn submit(&mut self, request: AnalysisRequest) -> &BatchState {
        self.submit_with_cancel(request, CancelToken::never()).await
    }

    /// Run a session that can be abandoned through `cancel`.
    ///
    /// A cancelled session leaves no results behind and returns to `Idle`.
    pub async fn submit_with_cancel(&mut self, request: AnalysisRequest, mut cancel: CancelToken) -> &BatchState {
        self.reset();
        self.session += 1;
        let session = self.session;

        self.state = BatchState::Validating;
        if let Err(e) = request.validate(self.config.max_resumes) {
            tracing::info!(session, error = %e, "Analysis request rejected");
            self.state = BatchState::Rejected(e);
            return &self.state;
        }

        let AnalysisRequest {
            job,
            requirement,
            resumes,
        } = request;

        // One snapshot for the whole session.
        let taxonomy = Arc::clone(&self.taxonomy);
        let resolved_job = ResolvedJob::resolve(&requirement, &taxonomy);

        let total = resumes.len();
        let mut queue: VecDeque<(usize, ResumeSubmission)> = resumes.into_iter().enumerate().collect();

        tracing::info!(
            session,
            total,
            remote = self.scorer.as_ref().map(|s| s.name()).unwrap_or("none"),
            "Starting batch analysis"
        );
        self.state = BatchState::Analyzing { completed: 0, total };

        while let Some((index, resume)) = queue.pop_front() {
            let step = self
                .score_one(index, &resume, &job, &resolved_job, &taxonomy, &mut cancel)
                .await;

            match step {
                Step::Scored(item) => {
                    tracing::debug!(
                        session,
                        index,
                        resume = %item.filename,
                        source = %item.score.source,
                        overall = item.score.overall,
                        "Scored resume"
                    );
                    self.results.push(item);
                    self.state = BatchState::Analyzing {
                        completed: self.results.len(),
                        total,
                    };
                }
                Step::Cancelled => {
                    tracing::warn!(session, discarded = self.results.len(), "Analysis cancelled");
                    self.reset();
                    return &self.state;
                }
                Step::Unreachable(e) => {
                    tracing::warn!(session, error = %e, discarded = self.results.len(), "Scoring service unreachable");
                    self.results.clear();
                    self.state = BatchState::Failed(e.to_string());
                    return &self.state;
                }
            }
        }

        debug_assert!(self.results.windows(2).all(|w| w[0].index < w[1].index));

        self.job = Some(job);
        self.state = BatchState::Completed;
        tracing::info!(session, total, "Batch analysis completed");
        &self.state
    }

    async fn score_one(
        &self,
        index: usize,
        resume: &ResumeSubmission,
        job: &JobDescription,
        resolved_job: &ResolvedJob,
        taxonomy: &TaxonomyIndex,
        cancel: &mut CancelToken,
    ) -> Step {
        if cancel.is_cancelled() {
            return Step::Cancelled;
        }

        let local = compute_local(&ResolvedProfile::resolve(&resume.profile, taxonomy), resolved_job);

        let remote = match &self.scorer {
            None => None,
            Some(_) if resume.file.content.is_empty() => {
                tracing::warn!(resume = resume.filename(), "Resume file is empty; using local estimate");
                Some(RemoteMatchOutcome::failed(resume.filename(), EMPTY_RESUME_ERROR))
            }
            Some(scorer) => {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Step::Cancelled,
                    result = scorer.score(job, resume) => result,
                };

                match result {
                    Ok(outcome) => Some(outcome),
                    Err(e) if e.is_unreachable() => return Step::Unreachable(e),
                    Err(e) => {
                        tracing::warn!(resume = resume.filename(), error = %e, "Remote scoring failed; using local estimate");
                        Some(RemoteMatchOutcome::failed(resume.filename(), e.to_string()))
                    }
                }
            }
        };

        Step::Scored(BatchItem {
            index,
            filename: resume.filename().to_string(),
            score: reconcile(remote.as_ref(), local),
        })
    }

    fn entries(&self) -> Vec<ReportEntry<'_>> {
        self.results
            .iter()
            .map(|item| ReportEntry {
                filename: &item.filename,
                score: &item.score,
            })
            .collect()
    }

    pub fn summary(&self) -> ReportSummary {
        summarize(&self.entries())
    }

    /// Render the report for a completed session.
    pub fn report<Tz: TimeZone>(&self, generated_at: &DateTime<Tz>) -> Option<String>
    where
        Tz::Offset: fmt::Display,
    {
        match (&self.state, &self.job) {
            (BatchState::Completed, Some(job)) => Some(render_report(job, &self.entries(), generated_at)),
            _ => None,
        }
    }
}
