//! Simulation tasks and batch construction.
//!
//! A [`Batch`] holds every task for one spec and one fight style. The first
//! race in the class's list becomes the baseline task: only it carries the
//! baseline profile and the optional custom script fragments. Every other
//! task is a set of overrides applied on top of that baseline.

use crate::catalog::RaceVariant;
use crate::error::{RaceSimError, Result};
use crate::profile::BaselineProfile;
use crate::settings::{FightStyle, SimSettings};
use crate::variants;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Parameters every task of a batch shares, taken verbatim from settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedParameters {
    pub fight_style: FightStyle,
    pub target_error: f64,
    pub iterations: u32,
    pub default_actions: bool,
    pub ptr: bool,
    pub executable: PathBuf,
}

impl SharedParameters {
    pub fn from_settings(settings: &SimSettings, fight_style: &FightStyle) -> Result<Self> {
        Ok(Self {
            fight_style: fight_style.clone(),
            target_error: settings.target_error_for(fight_style)?,
            iterations: settings.iterations,
            default_actions: settings.default_actions,
            ptr: settings.ptr,
            executable: settings.executable.clone(),
        })
    }
}

/// Custom script fragments appended to the baseline task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomScripts {
    pub apl: Option<String>,
    pub fight_style: Option<String>,
}

impl CustomScripts {
    /// Read the configured fragments. Unconfigured fragments stay `None`.
    pub fn load(settings: &SimSettings) -> Result<Self> {
        let read = |path: &Option<PathBuf>| -> Result<Option<String>> {
            match path {
                Some(path) => Ok(Some(fs::read_to_string(path)?)),
                None => Ok(None),
            }
        };
        Ok(Self {
            apl: read(&settings.custom_apl)?.filter(|s| !s.trim().is_empty()),
            fight_style: read(&settings.custom_fight_style)?.filter(|s| !s.trim().is_empty()),
        })
    }

    fn fragments(&self) -> Vec<String> {
        [&self.apl, &self.fight_style]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

/// One named simulation inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationTask {
    name: String,
    overrides: Vec<String>,
    shared: Arc<SharedParameters>,
    profile: Option<Arc<BaselineProfile>>,
    scripts: Vec<String>,
}

impl SimulationTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// simc `key=value` overrides, in order.
    pub fn overrides(&self) -> &[String] {
        &self.overrides
    }

    pub fn shared(&self) -> &SharedParameters {
        &self.shared
    }

    /// Only the baseline task has a profile.
    pub fn profile(&self) -> Option<&BaselineProfile> {
        self.profile.as_deref()
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    pub fn is_baseline(&self) -> bool {
        self.profile.is_some()
    }
}

/// Where a task came from: its race (index into the batch's race list) and
/// sub-variant choice, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOrigin {
    pub race: usize,
    pub sub_variant: Option<usize>,
}

/// All tasks for one spec and fight style.
#[derive(Debug, Clone)]
pub struct Batch {
    spec_id: String,
    races: Vec<RaceVariant>,
    tasks: Vec<SimulationTask>,
    origins: Vec<TaskOrigin>,
    shared: Arc<SharedParameters>,
    profile: Arc<BaselineProfile>,
}

impl Batch {
    pub fn spec_id(&self) -> &str {
        &self.spec_id
    }

    pub fn fight_style(&self) -> &FightStyle {
        &self.shared.fight_style
    }

    pub fn shared(&self) -> &SharedParameters {
        &self.shared
    }

    pub fn profile(&self) -> &BaselineProfile {
        &self.profile
    }

    pub fn races(&self) -> &[RaceVariant] {
        &self.races
    }

    pub fn tasks(&self) -> &[SimulationTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn baseline(&self) -> &SimulationTask {
        &self.tasks[0]
    }

    /// Tasks simulated as deltas against the baseline.
    pub fn profileset_tasks(&self) -> &[SimulationTask] {
        &self.tasks[1..]
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name())
    }

    /// Origin recorded for the task called `name`.
    pub fn origin_of(&self, name: &str) -> Option<TaskOrigin> {
        self.tasks
            .iter()
            .position(|t| t.name == name)
            .map(|i| self.origins[i])
    }

    /// SHA-256 over ordered task names and overrides.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.spec_id.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.shared.fight_style.as_str().as_bytes());
        for task in &self.tasks {
            hasher.update(b"\0");
            hasher.update(task.name.as_bytes());
            for o in &task.overrides {
                hasher.update(b"\x1f");
                hasher.update(o.as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Builds batches for one fight style and baseline profile.
#[derive(Debug, Clone)]
pub struct BatchBuilder<'a> {
    shared: Arc<SharedParameters>,
    profile: Arc<BaselineProfile>,
    scripts: &'a CustomScripts,
}

impl<'a> BatchBuilder<'a> {
    pub fn new(
        shared: Arc<SharedParameters>,
        profile: Arc<BaselineProfile>,
        scripts: &'a CustomScripts,
    ) -> Self {
        Self {
            shared,
            profile,
            scripts,
        }
    }

    /// One task per race plus sub-variant expansions, in race order.
    pub fn build(&self, spec_id: impl Into<String>, races: Vec<RaceVariant>) -> Result<Batch> {
        let spec_id = spec_id.into();
        if races.is_empty() {
            return Err(RaceSimError::Catalog(format!(
                "no races to simulate for {}",
                spec_id
            )));
        }

        let mut tasks = Vec::new();
        let mut origins = Vec::new();
        let mut seen = HashSet::new();

        for (race_index, race) in races.iter().enumerate() {
            for (i, variant) in variants::expand(race).into_iter().enumerate() {
                if !seen.insert(variant.name.clone()) {
                    return Err(RaceSimError::Catalog(format!(
                        "duplicate task name '{}' in {}",
                        variant.name, spec_id
                    )));
                }

                let baseline = race_index == 0 && i == 0;
                let task = SimulationTask {
                    name: variant.name,
                    overrides: variant.overrides,
                    shared: Arc::clone(&self.shared),
                    profile: baseline.then(|| Arc::clone(&self.profile)),
                    scripts: if baseline {
                        self.scripts.fragments()
                    } else {
                        Vec::new()
                    },
                };
                debug!(race = %race.full_name, task = %task.name, "Added task to batch");

                tasks.push(task);
                origins.push(TaskOrigin {
                    race: race_index,
                    sub_variant: variant.sub_variant,
                });
            }
        }

        Ok(Batch {
            spec_id,
            races,
            tasks,
            origins,
            shared: Arc::clone(&self.shared),
            profile: Arc::clone(&self.profile),
        })
    }
}
