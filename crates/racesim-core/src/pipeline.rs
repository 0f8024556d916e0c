//! The race simulation loop: fight styles × specs → batches → documents.
//!
//! Two failure kinds are contained per iteration: a spec without a baseline
//! profile is skipped for the whole run, and a failed batch skips only its
//! (fight style, spec) pair. Everything else propagates and halts the run.

use crate::batch::{Batch, BatchBuilder, CustomScripts, SharedParameters};
use crate::catalog::{Catalog, SpecRef};
use crate::error::Result;
use crate::executor::BatchExecutor;
use crate::profile::{BaselineProfile, ProfileLocator};
use crate::ranker::Ranking;
use crate::report::{ReportWriter, ResultDocument, SimcSettingsMeta};
use crate::resolver;
use crate::settings::{FightStyle, SimSettings};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    /// Specs skipped for a missing baseline profile.
    pub skipped_specs: Vec<String>,
    /// Batches that failed, as `(fight style, spec id)`.
    pub failed_batches: Vec<(String, String)>,
}

impl RunSummary {
    pub fn documents_written(&self) -> usize {
        self.written.len()
    }
}

/// A spec whose baseline profile was found.
struct ReadySpec<'c> {
    spec: SpecRef<'c>,
    profile: Arc<BaselineProfile>,
}

pub struct RaceSimulation<'a> {
    settings: &'a SimSettings,
    catalog: &'a Catalog,
}

impl<'a> RaceSimulation<'a> {
    pub fn new(settings: &'a SimSettings, catalog: &'a Catalog) -> Self {
        Self { settings, catalog }
    }

    /// Simulate every selected spec for every fight style and write one
    /// document per successful batch.
    pub async fn run(
        &self,
        executor: &dyn BatchExecutor,
        writer: &ReportWriter,
    ) -> Result<RunSummary> {
        let scripts = CustomScripts::load(self.settings)?;
        let mut summary = RunSummary::default();
        let specs = self.ready_specs(&mut summary.skipped_specs)?;

        info!(
            backend = executor.name(),
            specs = specs.len(),
            fight_styles = self.settings.fight_styles.len(),
            "Starting race simulations"
        );

        for fight_style in &self.settings.fight_styles {
            let shared = Arc::new(SharedParameters::from_settings(self.settings, fight_style)?);

            for ready in &specs {
                let spec_id = ready.spec.id();
                let batch = self.build_batch(ready, &shared, &scripts)?;
                let digest = batch.digest();
                info!(
                    fight_style = %fight_style,
                    spec = %spec_id,
                    tasks = batch.len(),
                    digest = &digest[..12],
                    "Running race simulation"
                );

                let outcome = match executor.execute(&batch).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(fight_style = %fight_style, spec = %spec_id, error = %e, "Race simulation failed");
                        summary.failed_batches.push((fight_style.to_string(), spec_id));
                        continue;
                    }
                };
                if let Err(e) = outcome.verify(&batch) {
                    error!(fight_style = %fight_style, spec = %spec_id, error = %e, "Race simulation returned incomplete results");
                    summary.failed_batches.push((fight_style.to_string(), spec_id));
                    continue;
                }
                info!(fight_style = %fight_style, spec = %spec_id, "Race simulation finished");

                let ordered = outcome.in_task_order(&batch);
                for result in &ordered {
                    debug!(task = %result.name, dps = result.dps, "Task result");
                }
                let resolved = resolver::resolve(&batch, &ordered, self.settings.resolver)?;
                let ranking = Ranking::new(resolved);
                ranking.log_winner(&spec_id, fight_style.as_str());

                let meta = self.meta(ready.spec, fight_style, &shared, outcome.simc_hash.clone());
                let document = ResultDocument::new(
                    ready.spec,
                    fight_style,
                    meta,
                    ready.profile.summary().clone(),
                    &ranking,
                    Utc::now(),
                );
                let path = writer.write(&document, ready.spec, fight_style)?;
                info!(path = %path.display(), "Wrote race results");
                summary.written.push(path);
            }
        }

        info!(
            written = summary.written.len(),
            skipped_specs = summary.skipped_specs.len(),
            failed_batches = summary.failed_batches.len(),
            "Race simulations complete"
        );
        Ok(summary)
    }

    /// Build every batch a run would execute, without executing anything.
    ///
    /// Specs without a baseline profile are left out, as in [`run`](Self::run).
    pub fn plan(&self) -> Result<Vec<Batch>> {
        let scripts = CustomScripts::load(self.settings)?;
        let mut skipped = Vec::new();
        let specs = self.ready_specs(&mut skipped)?;

        let mut batches = Vec::new();
        for fight_style in &self.settings.fight_styles {
            let shared = Arc::new(SharedParameters::from_settings(self.settings, fight_style)?);
            for ready in &specs {
                batches.push(self.build_batch(ready, &shared, &scripts)?);
            }
        }
        Ok(batches)
    }

    /// Selected specs whose profiles load. Missing ones are logged and
    /// recorded in `skipped`.
    fn ready_specs(&self, skipped: &mut Vec<String>) -> Result<Vec<ReadySpec<'a>>> {
        let locator = ProfileLocator::from_settings(self.settings);
        let mut ready = Vec::new();
        for spec in self.catalog.select_specs(&self.settings.specs)? {
            if !locator.exists(spec) {
                let path = locator.path(spec);
                warn!(spec = %spec.id(), path = %path.display(), "No baseline profile, skipping spec");
                skipped.push(spec.id());
                continue;
            }
            ready.push(ReadySpec {
                spec,
                profile: Arc::new(locator.load(spec)?),
            });
        }
        Ok(ready)
    }

    fn build_batch(
        &self,
        ready: &ReadySpec<'_>,
        shared: &Arc<SharedParameters>,
        scripts: &CustomScripts,
    ) -> Result<Batch> {
        let races = self.catalog.races_for(ready.spec.class)?;
        BatchBuilder::new(Arc::clone(shared), Arc::clone(&ready.profile), scripts)
            .build(ready.spec.id(), races)
    }

    fn meta(
        &self,
        spec: SpecRef<'_>,
        fight_style: &FightStyle,
        shared: &SharedParameters,
        simc_hash: Option<String>,
    ) -> SimcSettingsMeta {
        SimcSettingsMeta {
            class: spec.class.simc_name.clone(),
            spec: spec.spec.simc_name.clone(),
            fight_style: fight_style.to_string(),
            tier: self.settings.tier.clone(),
            iterations: shared.iterations,
            target_error: shared.target_error,
            ptr: shared.ptr,
            simc_hash,
        }
    }
}
