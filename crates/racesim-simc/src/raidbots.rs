//! Raidbots remote backend.
//!
//! A batch is submitted as one "advanced" sim, polled until the job
//! finishes, and its json2 report downloaded. There are no retries: any
//! non-success status fails the batch.

use crate::input::{render_input, ThreadOptions};
use crate::json2::parse_report;
use async_trait::async_trait;
use racesim_core::{Batch, BatchExecutor, BatchOutcome, ExecutorError, SimSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Raidbots connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RaidbotsConfig {
    /// Server root, e.g. `https://www.raidbots.com`.
    pub base_url: String,
    pub api_key: String,
    /// simc build to request (`nightly`, `latest`, ...).
    pub simc_version: String,
    pub poll_interval: Duration,
    /// Limit for submit, wait and download together. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl RaidbotsConfig {
    pub fn from_settings(settings: &SimSettings, api_key: &str) -> Self {
        let backend = &settings.backend;
        Self {
            base_url: backend.raidbots_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            simc_version: backend.simc_version.clone(),
            poll_interval: Duration::from_secs(backend.poll_interval_secs),
            timeout: (backend.timeout_secs > 0).then(|| Duration::from_secs(backend.timeout_secs)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    api_key: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    advanced_input: String,
    simc_version: &'a str,
    report_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    sim_id: String,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    job: JobStatus,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    state: String,
}

fn http_error(e: reqwest::Error) -> ExecutorError {
    ExecutorError::Http(e.to_string())
}

/// Runs batches on Raidbots.
#[derive(Debug, Clone)]
pub struct RaidbotsExecutor {
    config: RaidbotsConfig,
    client: reqwest::Client,
}

impl RaidbotsExecutor {
    pub fn new(config: RaidbotsConfig) -> Result<Self, ExecutorError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("racesim/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(http_error)?;
        Ok(Self { config, client })
    }

    async fn submit(&self, batch: &Batch) -> Result<String, ExecutorError> {
        let request = SubmitRequest {
            api_key: &self.config.api_key,
            kind: "advanced",
            advanced_input: render_input(batch, ThreadOptions::default()),
            simc_version: &self.config.simc_version,
            report_name: format!("racesim {} {}", batch.spec_id(), batch.fight_style()),
        };
        let response: SubmitResponse = self
            .client
            .post(format!("{}/sim", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?
            .json()
            .await
            .map_err(http_error)?;
        Ok(response.sim_id)
    }

    async fn wait_for(&self, sim_id: &str) -> Result<(), ExecutorError> {
        let url = format!("{}/api/job/{}", self.config.base_url, sim_id);
        loop {
            let status: JobResponse = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(http_error)?
                .error_for_status()
                .map_err(http_error)?
                .json()
                .await
                .map_err(http_error)?;

            match status.job.state.as_str() {
                "complete" => return Ok(()),
                "failed" => {
                    return Err(ExecutorError::Remote(format!("sim {} failed", sim_id)));
                }
                state @ ("queued" | "active") => {
                    debug!(sim_id, state, "Raidbots job pending");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                state => {
                    return Err(ExecutorError::Remote(format!(
                        "sim {} in unexpected state '{}'",
                        sim_id, state
                    )));
                }
            }
        }
    }

    async fn fetch_report(&self, sim_id: &str) -> Result<Vec<u8>, ExecutorError> {
        let bytes = self
            .client
            .get(format!("{}/reports/{}/data.json", self.config.base_url, sim_id))
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?
            .bytes()
            .await
            .map_err(http_error)?;
        Ok(bytes.to_vec())
    }

    async fn simulate(&self, batch: &Batch) -> Result<BatchOutcome, ExecutorError> {
        let sim_id = self.submit(batch).await?;
        info!(sim_id = %sim_id, spec = batch.spec_id(), "Submitted Raidbots sim");
        self.wait_for(&sim_id).await?;
        let report = self.fetch_report(&sim_id).await?;
        parse_report(&report, batch)
    }
}

#[async_trait]
impl BatchExecutor for RaidbotsExecutor {
    fn name(&self) -> &'static str {
        "raidbots"
    }

    async fn execute(&self, batch: &Batch) -> Result<BatchOutcome, ExecutorError> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.simulate(batch))
                .await
                .map_err(|_| ExecutorError::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => self.simulate(batch).await,
        }
    }
}
