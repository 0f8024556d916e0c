//! In-memory executor for tests and dry runs.
//!
//! `FakeExecutor` answers batches from a DPS table instead of running simc.
//! It records every batch it sees so tests can assert on what was submitted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::batch::Batch;
use crate::error::ExecutorError;
use crate::executor::{BatchExecutor, BatchOutcome, TaskResult};

/// A batch the fake executed (or refused).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedBatch {
    pub spec_id: String,
    pub fight_style: String,
    pub task_names: Vec<String>,
}

/// Executor backed by a `task name → DPS` table.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    dps: HashMap<String, f64>,
    fallback_dps: Option<f64>,
    simc_hash: Option<String>,
    failing_fight_styles: HashSet<String>,
    dropped_results: HashSet<String>,
    submitted: Mutex<Vec<SubmittedBatch>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dps(mut self, task: &str, dps: f64) -> Self {
        self.dps.insert(task.to_string(), dps);
        self
    }

    /// DPS for tasks missing from the table.
    pub fn with_fallback_dps(mut self, dps: f64) -> Self {
        self.fallback_dps = Some(dps);
        self
    }

    pub fn with_simc_hash(mut self, hash: &str) -> Self {
        self.simc_hash = Some(hash.to_string());
        self
    }

    /// Fail every batch for this fight style.
    pub fn failing_for(mut self, fight_style: &str) -> Self {
        self.failing_fight_styles.insert(fight_style.to_string());
        self
    }

    /// Leave this task out of the results, like a backend losing a profileset.
    pub fn dropping(mut self, task: &str) -> Self {
        self.dropped_results.insert(task.to_string());
        self
    }

    pub fn submitted(&self) -> Vec<SubmittedBatch> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchExecutor for FakeExecutor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn execute(&self, batch: &Batch) -> Result<BatchOutcome, ExecutorError> {
        self.submitted.lock().unwrap().push(SubmittedBatch {
            spec_id: batch.spec_id().to_string(),
            fight_style: batch.fight_style().to_string(),
            task_names: batch.task_names().map(str::to_string).collect(),
        });

        if self
            .failing_fight_styles
            .contains(batch.fight_style().as_str())
        {
            return Err(ExecutorError::ProcessFailed {
                code: 1,
                stderr: format!("simulated failure for {}", batch.fight_style()),
            });
        }

        let mut results = Vec::with_capacity(batch.len());
        for name in batch.task_names() {
            if self.dropped_results.contains(name) {
                continue;
            }
            let dps = self
                .dps
                .get(name)
                .copied()
                .or(self.fallback_dps)
                .ok_or_else(|| {
                    ExecutorError::InvalidOutput(format!("no DPS configured for '{}'", name))
                })?;
            results.push(TaskResult::new(name, dps));
        }

        Ok(BatchOutcome {
            results,
            simc_hash: self.simc_hash.clone(),
        })
    }
}
