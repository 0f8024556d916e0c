//! Local simc process backend.

use crate::input::{render_input, ThreadOptions};
use crate::json2::parse_report;
use async_trait::async_trait;
use racesim_core::{Batch, BatchExecutor, BatchOutcome, ExecutorError, SimSettings};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// How the local backend runs simc.
#[derive(Debug, Clone, PartialEq)]
pub struct SimcConfig {
    /// Directory for input and json2 files.
    pub work_dir: PathBuf,
    pub threads: u32,
    pub profileset_work_threads: u32,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub keep_files: bool,
}

impl SimcConfig {
    pub fn from_settings(settings: &SimSettings) -> Self {
        let backend = &settings.backend;
        Self {
            work_dir: backend.work_dir.clone(),
            threads: settings.threads,
            profileset_work_threads: settings.profileset_work_threads,
            timeout: (backend.timeout_secs > 0).then(|| Duration::from_secs(backend.timeout_secs)),
            keep_files: backend.keep_files,
        }
    }
}

/// Runs each batch as one simc profileset simulation.
///
/// The executable comes from the batch's shared parameters.
#[derive(Debug, Clone)]
pub struct SimcExecutor {
    config: SimcConfig,
}

impl SimcExecutor {
    pub fn new(config: SimcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimcConfig {
        &self.config
    }

    async fn run_simc(
        &self,
        executable: &Path,
        input: &Path,
        output: &Path,
    ) -> Result<(), ExecutorError> {
        let child = Command::new(executable)
            .arg(input)
            .arg(format!("json2={}", output.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                executable: executable.display().to_string(),
                source,
            })?;

        let output = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ExecutorError::Timeout {
                    secs: limit.as_secs(),
                })??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            return Err(ExecutorError::ProcessFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn simulate(
        &self,
        batch: &Batch,
        input: &Path,
        output: &Path,
    ) -> Result<BatchOutcome, ExecutorError> {
        self.run_simc(&batch.shared().executable, input, output).await?;
        let json = tokio::fs::read(output).await?;
        parse_report(&json, batch)
    }

    async fn cleanup(&self, paths: &[&Path]) {
        if self.config.keep_files {
            return;
        }
        for path in paths {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove simc work file");
                }
            }
        }
    }
}

#[async_trait]
impl BatchExecutor for SimcExecutor {
    fn name(&self) -> &'static str {
        "simc"
    }

    async fn execute(&self, batch: &Batch) -> Result<BatchOutcome, ExecutorError> {
        let digest = batch.digest();
        let stem = format!("racesim_{}", &digest[..12]);
        let input_path = self.config.work_dir.join(format!("{}.simc", stem));
        let output_path = self.config.work_dir.join(format!("{}.json", stem));

        let input = render_input(
            batch,
            ThreadOptions {
                threads: Some(self.config.threads),
                profileset_work_threads: Some(self.config.profileset_work_threads),
            },
        );
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        tokio::fs::write(&input_path, input).await?;
        debug!(input = %input_path.display(), tasks = batch.len(), "Wrote simc input");

        let started = Instant::now();
        let result = self.simulate(batch, &input_path, &output_path).await;

        self.cleanup(&[&input_path, &output_path]).await;
        if result.is_ok() {
            info!(
                spec = batch.spec_id(),
                fight_style = %batch.fight_style(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "simc finished"
            );
        }
        result
    }
}
