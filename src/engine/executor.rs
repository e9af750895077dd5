use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::runner::StepRunner;
use super::step::{RetryConfig, StepError, StepRecord};
use super::store::RunStore;

/// Outcome a finished run reports back to the transport/observability
/// layer. `success` is false only for run-fatal failures and exhausted
/// retries; degraded enrichment still reports success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// Structured audit record produced at run completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub workflow: String,
    pub status: RunStatus,
    pub outcome: RunOutcome,
    pub attempts: u32,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// A durable, step-wise background function. Implementations express
/// their sequence through [`StepRunner::run`] and classify every
/// collaborator error as retriable or fatal; the engine owns scheduling,
/// memoization, and reporting.
#[async_trait]
pub trait Workflow: Send + Sync {
    type Event: Send + Sync;

    /// Stable workflow identifier; prefixes the run id.
    fn id(&self) -> &'static str;

    /// Run key derived from the triggering event. Redeliveries of the
    /// same logical event must map to the same key so their side effects
    /// collapse into one run.
    fn run_key(&self, event: &Self::Event) -> String;

    async fn run(&self, step: &mut StepRunner, event: &Self::Event) -> Result<(), StepError>;
}

/// Drives workflows to a terminal outcome. Errors never escape
/// [`Engine::execute`]: every ending is recorded, persisted, and
/// reported through tracing.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn RunStore>,
    retry: RetryConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn RunStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    pub async fn execute<W: Workflow>(&self, workflow: &W, event: &W::Event) -> RunRecord {
        let run_id = format!("{}:{}", workflow.id(), workflow.run_key(event));
        let started_at = Utc::now();
        info!(run_id = %run_id, workflow = workflow.id(), "starting workflow run");

        let mut attempt: u32 = 0;
        let outcome = loop {
            let mut step = StepRunner::new(&run_id, Arc::clone(&self.store));
            match workflow.run(&mut step, event).await {
                Ok(()) => break RunOutcome::success(),
                Err(StepError::Fatal(reason)) => {
                    error!(run_id = %run_id, %reason, "workflow run failed");
                    break RunOutcome::failure(reason);
                }
                Err(StepError::Retriable(reason)) => {
                    if attempt >= self.retry.max_retries {
                        error!(
                            run_id = %run_id,
                            attempts = attempt + 1,
                            %reason,
                            "workflow run failed, retries exhausted"
                        );
                        break RunOutcome::failure(reason);
                    }
                    attempt += 1;
                    let delay_ms = self.retry.delay_for_attempt(attempt);
                    warn!(
                        run_id = %run_id,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms,
                        %reason,
                        "retrying workflow run"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        };

        let completed_at = Utc::now();
        let status = if outcome.success {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };
        let record = RunRecord {
            run_id: run_id.clone(),
            workflow: workflow.id().to_string(),
            status,
            outcome,
            attempts: attempt + 1,
            steps: self.store.steps(&run_id).unwrap_or_default(),
            started_at,
            completed_at,
            duration_ms: (completed_at - started_at).num_milliseconds(),
        };
        if let Err(e) = self.store.save_run(&record) {
            warn!(run_id = %run_id, error = %e, "failed to persist run record");
        }
        if record.status == RunStatus::Succeeded {
            info!(run_id = %run_id, attempts = record.attempts, "workflow run succeeded");
        }
        record
    }
}
