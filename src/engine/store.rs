//! Durable state behind the step executor: per-step memo records and
//! finished run records. [`InMemoryRunStore`] backs the demo and tests;
//! [`FileRunStore`] persists to a JSON file so memoization and run
//! history survive process restarts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::executor::RunRecord;
use super::step::StepRecord;
use crate::store::StoreError;

pub trait RunStore: Send + Sync {
    fn load_step(&self, run_id: &str, step: &str) -> Result<Option<StepRecord>, StoreError>;
    /// Insert or replace the record for `(run_id, record.name)`.
    fn save_step(&self, run_id: &str, record: &StepRecord) -> Result<(), StoreError>;
    /// Step records for one run, in first-execution order.
    fn steps(&self, run_id: &str) -> Result<Vec<StepRecord>, StoreError>;
    fn save_run(&self, record: &RunRecord) -> Result<(), StoreError>;
    fn list_runs(&self) -> Result<Vec<RunRecord>, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RunState {
    steps: HashMap<String, Vec<StepRecord>>,
    runs: Vec<RunRecord>,
}

impl RunState {
    fn upsert_step(&mut self, run_id: &str, record: &StepRecord) {
        let steps = self.steps.entry(run_id.to_string()).or_default();
        match steps.iter_mut().find(|s| s.name == record.name) {
            Some(existing) => *existing = record.clone(),
            None => steps.push(record.clone()),
        }
    }

    fn upsert_run(&mut self, record: &RunRecord) {
        match self.runs.iter_mut().find(|r| r.run_id == record.run_id) {
            Some(existing) => *existing = record.clone(),
            None => self.runs.push(record.clone()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryRunStore {
    state: Mutex<RunState>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable("run store lock poisoned".into())
}

impl RunStore for InMemoryRunStore {
    fn load_step(&self, run_id: &str, step: &str) -> Result<Option<StepRecord>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state
            .steps
            .get(run_id)
            .and_then(|steps| steps.iter().find(|s| s.name == step).cloned()))
    }

    fn save_step(&self, run_id: &str, record: &StepRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.upsert_step(run_id, record);
        Ok(())
    }

    fn steps(&self, run_id: &str) -> Result<Vec<StepRecord>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.steps.get(run_id).cloned().unwrap_or_default())
    }

    fn save_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.upsert_run(record);
        Ok(())
    }

    fn list_runs(&self) -> Result<Vec<RunRecord>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.runs.clone())
    }
}

/// JSON-file-backed run store. Every mutation rewrites the file, which is
/// small (step memos and run summaries, not ticket data).
pub struct FileRunStore {
    path: PathBuf,
    state: Mutex<RunState>,
}

impl FileRunStore {
    /// Open the store at `path`, loading existing state if the file is
    /// present and starting empty otherwise.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| StoreError::Unavailable(format!("read {}: {e}", path.display())))?;
            serde_json::from_str(&contents)
                .map_err(|e| StoreError::Unavailable(format!("parse {}: {e}", path.display())))?
        } else {
            RunState::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &RunState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("create {}: {e}", parent.display())))?;
        }
        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Unavailable(format!("encode run store: {e}")))?;
        fs::write(&self.path, contents)
            .map_err(|e| StoreError::Unavailable(format!("write {}: {e}", self.path.display())))
    }
}

impl RunStore for FileRunStore {
    fn load_step(&self, run_id: &str, step: &str) -> Result<Option<StepRecord>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state
            .steps
            .get(run_id)
            .and_then(|steps| steps.iter().find(|s| s.name == step).cloned()))
    }

    fn save_step(&self, run_id: &str, record: &StepRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.upsert_step(run_id, record);
        self.persist(&state)
    }

    fn steps(&self, run_id: &str) -> Result<Vec<StepRecord>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.steps.get(run_id).cloned().unwrap_or_default())
    }

    fn save_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.upsert_run(record);
        self.persist(&state)
    }

    fn list_runs(&self) -> Result<Vec<RunRecord>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.runs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::executor::{RunOutcome, RunStatus};
    use crate::engine::step::StepStatus;
    use chrono::Utc;

    fn record(name: &str) -> StepRecord {
        StepRecord {
            name: name.into(),
            status: StepStatus::Succeeded,
            result: Some(serde_json::json!(42)),
            error: None,
            attempts: 1,
        }
    }

    fn run_record(run_id: &str) -> RunRecord {
        let now = Utc::now();
        RunRecord {
            run_id: run_id.into(),
            workflow: "test".into(),
            status: RunStatus::Succeeded,
            outcome: RunOutcome::success(),
            attempts: 1,
            steps: Vec::new(),
            started_at: now,
            completed_at: now,
            duration_ms: 0,
        }
    }

    #[test]
    fn memory_store_upserts_steps_in_order() {
        let store = InMemoryRunStore::new();
        store.save_step("run-1", &record("a")).unwrap();
        store.save_step("run-1", &record("b")).unwrap();
        let mut updated = record("a");
        updated.attempts = 2;
        store.save_step("run-1", &updated).unwrap();

        let steps = store.steps("run-1").unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(steps[0].attempts, 2);

        assert_eq!(store.load_step("run-1", "b").unwrap().unwrap().name, "b");
        assert!(store.load_step("run-2", "a").unwrap().is_none());
    }

    #[test]
    fn memory_store_replaces_run_record() {
        let store = InMemoryRunStore::new();
        store.save_run(&run_record("run-1")).unwrap();
        let mut second = run_record("run-1");
        second.attempts = 3;
        store.save_run(&second).unwrap();

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].attempts, 3);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state").join("runs.json");

        {
            let store = FileRunStore::open(&path).unwrap();
            store.save_step("run-1", &record("fetch")).unwrap();
            store.save_run(&run_record("run-1")).unwrap();
        }

        let reopened = FileRunStore::open(&path).unwrap();
        let step = reopened.load_step("run-1", "fetch").unwrap().unwrap();
        assert_eq!(step.result, Some(serde_json::json!(42)));
        assert_eq!(reopened.list_runs().unwrap().len(), 1);
    }

    #[test]
    fn file_store_starts_empty_without_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileRunStore::open(dir.path().join("runs.json")).unwrap();
        assert!(store.list_runs().unwrap().is_empty());
    }
}
