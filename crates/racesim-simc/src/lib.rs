//! SimulationCraft backends for racesim.
//!
//! - [`SimcExecutor`] runs a local simc binary per batch
//! - [`RaidbotsExecutor`] submits batches to Raidbots
//!
//! Both render the same profileset input and parse the same json2 report.

pub mod input;
pub mod json2;
mod local;
mod raidbots;

pub use input::{render_input, ThreadOptions};
pub use json2::parse_report;
pub use local::{SimcConfig, SimcExecutor};
pub use raidbots::{RaidbotsConfig, RaidbotsExecutor};

use racesim_core::{BackendChoice, BatchExecutor, ExecutorError, SimSettings};

/// The executor `settings` asks for.
pub fn executor_for(settings: &SimSettings) -> Result<Box<dyn BatchExecutor>, ExecutorError> {
    match settings.backend.choice() {
        BackendChoice::Raidbots { api_key } => Ok(Box::new(RaidbotsExecutor::new(
            RaidbotsConfig::from_settings(settings, api_key),
        )?)),
        BackendChoice::Local => Ok(Box::new(SimcExecutor::new(SimcConfig::from_settings(
            settings,
        )))),
    }
}
