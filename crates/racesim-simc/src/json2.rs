//! simc `json2` report parsing.
//!
//! Only the fields the race comparison needs are modelled: the baseline
//! actor's mean DPS, each profileset's mean and the build identifier.

use racesim_core::{Batch, BatchOutcome, ExecutorError, TaskResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Report {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    git_revision: Option<String>,
    sim: Sim,
}

#[derive(Debug, Deserialize)]
struct Sim {
    #[serde(default)]
    players: Vec<Player>,
    #[serde(default)]
    profilesets: Option<Profilesets>,
}

#[derive(Debug, Deserialize)]
struct Player {
    collected_data: CollectedData,
}

#[derive(Debug, Deserialize)]
struct CollectedData {
    dps: Mean,
}

#[derive(Debug, Deserialize)]
struct Mean {
    mean: f64,
}

#[derive(Debug, Deserialize)]
struct Profilesets {
    #[serde(default)]
    results: Vec<ProfilesetResult>,
}

#[derive(Debug, Deserialize)]
struct ProfilesetResult {
    name: String,
    mean: f64,
}

/// Parse a json2 report produced for `batch`.
///
/// The first actor's DPS is reported under the baseline task's name.
pub fn parse_report(json: &[u8], batch: &Batch) -> Result<BatchOutcome, ExecutorError> {
    let report: Report = serde_json::from_slice(json)
        .map_err(|e| ExecutorError::InvalidOutput(format!("json2 report: {}", e)))?;

    let baseline = report
        .sim
        .players
        .first()
        .ok_or_else(|| ExecutorError::InvalidOutput("json2 report has no players".to_string()))?;

    let mut results = vec![TaskResult::new(
        batch.baseline().name(),
        baseline.collected_data.dps.mean,
    )];
    if let Some(profilesets) = report.sim.profilesets {
        results.extend(
            profilesets
                .results
                .into_iter()
                .map(|r| TaskResult::new(r.name, r.mean)),
        );
    }

    let simc_hash = report
        .git_revision
        .filter(|s| !s.is_empty())
        .or(report.version);

    Ok(BatchOutcome { results, simc_hash })
}
