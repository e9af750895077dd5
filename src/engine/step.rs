use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Distinguishes failures that retrying the run can fix from failures
/// that are permanent. Collaborator errors are converted into one of
/// these at the step that produced them; nothing else escapes a step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// Infrastructure hiccup (store or transport momentarily unavailable).
    /// The whole run is rescheduled with backoff.
    #[error("retriable failure: {0}")]
    Retriable(String),

    /// Permanent condition (referenced document gone, unreadable state).
    /// The run terminates immediately.
    #[error("fatal failure: {0}")]
    Fatal(String),
}

/// Lifecycle of one step within a run. `Pending` is written before the
/// step body executes, so a crash mid-step is visible in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Durable record of one step, keyed by `(run id, step name)` in the
/// run store. A succeeded record short-circuits re-execution on retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub attempts: u32,
}

/// Configuration for run-level retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries beyond the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given retry attempt using exponential backoff.
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms * 2u64.pow(attempt.saturating_sub(1))
    }
}
