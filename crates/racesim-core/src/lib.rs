//! racesim-core: race DPS comparisons for SimulationCraft
//!
//! Builds one batch of simulations per (fight style, spec), hands it to a
//! [`BatchExecutor`], maps the results back to races and writes one ranked
//! JSON document per batch.
//!
//! ## Key Components
//!
//! - `BatchBuilder`: expands a class's races (and their sub-variants) into tasks
//! - `BatchExecutor`: the backend seam; see the `racesim-simc` crate
//! - `resolver`: maps result names back to races and localized names
//! - `Ranking` / `ResultDocument` / `ReportWriter`: ordering and output
//! - `RaceSimulation`: the run loop

pub mod batch;
pub mod catalog;
mod error;
pub mod executor;
pub mod fakes;
pub mod pipeline;
pub mod profile;
pub mod ranker;
pub mod report;
pub mod resolver;
pub mod settings;
pub mod telemetry;
pub mod variants;

pub use batch::{Batch, BatchBuilder, CustomScripts, SharedParameters, SimulationTask, TaskOrigin};
pub use catalog::{Catalog, RaceVariant, SpecRef, SubVariant, SubVariantSet, WowClass, WowSpec};
pub use error::{ExecutorError, RaceSimError, Result};
pub use executor::{BatchExecutor, BatchOutcome, TaskResult};
pub use pipeline::{RaceSimulation, RunSummary};
pub use profile::{BaselineProfile, ProfileLocator, ProfileSummary};
pub use ranker::Ranking;
pub use report::{ReportWriter, ResultDocument, SimcSettingsMeta};
pub use resolver::{ResolvedResult, ResolverStrategy};
pub use settings::{BackendChoice, BackendSettings, FightStyle, SimSettings};
