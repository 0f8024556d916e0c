//! The batch executor seam.
//!
//! Backends (local simc, Raidbots, in-memory fakes) all implement
//! [`BatchExecutor`]. The pipeline never knows which one it is talking to.

use crate::batch::Batch;
use crate::error::ExecutorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mean DPS of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub name: String,
    pub dps: f64,
}

impl TaskResult {
    pub fn new(name: impl Into<String>, dps: f64) -> Self {
        Self {
            name: name.into(),
            dps,
        }
    }
}

/// Everything a backend returns for one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Results in whatever order the backend produced them.
    pub results: Vec<TaskResult>,

    /// simc build identifier of the run, when the backend reports one.
    pub simc_hash: Option<String>,
}

impl BatchOutcome {
    /// Check that every task has exactly one result and nothing else came back.
    pub fn verify(&self, batch: &Batch) -> Result<(), ExecutorError> {
        let mut counts: HashMap<&str, usize> = batch.task_names().map(|n| (n, 0)).collect();
        for result in &self.results {
            match counts.get_mut(result.name.as_str()) {
                Some(count) => *count += 1,
                None => {
                    return Err(ExecutorError::IncompleteResults(format!(
                        "unexpected result '{}'",
                        result.name
                    )))
                }
            }
        }
        if let Some(name) = batch.task_names().find(|n| counts[n] != 1) {
            return Err(ExecutorError::IncompleteResults(format!(
                "task '{}' has {} results",
                name, counts[name]
            )));
        }
        Ok(())
    }

    /// Results reordered to match the batch's task order.
    ///
    /// Call after [`verify`](Self::verify); tasks without a result are skipped.
    pub fn in_task_order(&self, batch: &Batch) -> Vec<TaskResult> {
        batch
            .task_names()
            .filter_map(|name| self.results.iter().find(|r| r.name == name).cloned())
            .collect()
    }
}

/// Runs a whole batch and returns one result per task, or fails as a unit.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn execute(&self, batch: &Batch) -> Result<BatchOutcome, ExecutorError>;
}
