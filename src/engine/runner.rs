use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::step::{StepError, StepRecord, StepStatus};
use super::store::RunStore;

/// Handed to a workflow for one attempt of one run. Each named step runs
/// at most once per run: a succeeded step's memoized result is returned
/// directly on later attempts, which is what makes run-level retries
/// safe around non-idempotent side effects.
pub struct StepRunner {
    run_id: String,
    store: Arc<dyn RunStore>,
}

impl StepRunner {
    pub(crate) fn new(run_id: &str, store: Arc<dyn RunStore>) -> Self {
        Self {
            run_id: run_id.to_string(),
            store,
        }
    }

    /// Execute the named step, memoizing its success result.
    ///
    /// The result type must round-trip through JSON, since a memoized
    /// value is replayed from the store rather than recomputed.
    pub async fn run<T, F, Fut>(&mut self, name: &str, f: F) -> Result<T, StepError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StepError>>,
    {
        let prior = self
            .store
            .load_step(&self.run_id, name)
            .map_err(|e| StepError::Retriable(e.to_string()))?;

        if let Some(record) = &prior
            && record.status == StepStatus::Succeeded
        {
            debug!(run_id = %self.run_id, step = name, "step already succeeded, replaying memoized result");
            let value = record.result.clone().unwrap_or(serde_json::Value::Null);
            return serde_json::from_value(value).map_err(|e| {
                StepError::Fatal(format!("memoized result for step '{name}' is unreadable: {e}"))
            });
        }

        let attempts = prior.map(|r| r.attempts).unwrap_or(0) + 1;
        self.save(StepRecord {
            name: name.to_string(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            attempts,
        })?;

        match f().await {
            Ok(value) => {
                let result = serde_json::to_value(&value).map_err(|e| {
                    StepError::Fatal(format!("result of step '{name}' is not serializable: {e}"))
                })?;
                self.save(StepRecord {
                    name: name.to_string(),
                    status: StepStatus::Succeeded,
                    result: Some(result),
                    error: None,
                    attempts,
                })?;
                debug!(run_id = %self.run_id, step = name, attempts, "step succeeded");
                Ok(value)
            }
            Err(err) => {
                self.save(StepRecord {
                    name: name.to_string(),
                    status: StepStatus::Failed,
                    result: None,
                    error: Some(err.to_string()),
                    attempts,
                })?;
                Err(err)
            }
        }
    }

    fn save(&self, record: StepRecord) -> Result<(), StepError> {
        self.store
            .save_step(&self.run_id, &record)
            .map_err(|e| StepError::Retriable(e.to_string()))
    }
}
