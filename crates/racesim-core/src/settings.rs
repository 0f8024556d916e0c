//! Run settings.
//!
//! `SimSettings` is built once (TOML file plus CLI overrides), validated, and
//! then only ever passed by reference. Nothing in a run mutates it.

use crate::error::{RaceSimError, Result};
use crate::resolver::ResolverStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A named simc encounter profile, e.g. `patchwerk`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FightStyle(String);

impl FightStyle {
    pub fn new(name: impl Into<String>) -> Self {
        FightStyle(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used in result file names.
    pub fn file_stem(&self) -> String {
        self.0.to_lowercase()
    }

    /// Human-readable form used in document titles, e.g. `Patchwerk`.
    pub fn title(&self) -> String {
        crate::catalog::title_case(&self.0)
    }
}

impl fmt::Display for FightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings for a whole race simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimSettings {
    /// Profile tier, e.g. `TWW1`. Selects the baseline profile directory.
    #[serde(default = "default_tier")]
    pub tier: String,

    /// Path to the simc executable.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Root of the baseline profile tree (`<dir>/<tier>/<tier>_<Class>_<Spec>.simc`).
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,

    /// Root of the results tree. Documents land in `<dir>/races/`.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Fight styles to simulate, in order.
    #[serde(default = "default_fight_styles")]
    pub fight_styles: Vec<FightStyle>,

    /// Target statistical error per fight style.
    #[serde(default = "default_target_error")]
    pub target_error: BTreeMap<String, f64>,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// simc worker threads.
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// simc threads per profileset.
    #[serde(default = "default_profileset_work_threads")]
    pub profileset_work_threads: u32,

    /// Simulate against the PTR game data.
    #[serde(default)]
    pub ptr: bool,

    /// Use simc's default action lists instead of the profile's own.
    #[serde(default = "default_true")]
    pub default_actions: bool,

    /// Custom rotation appended to the baseline task.
    #[serde(default)]
    pub custom_apl: Option<PathBuf>,

    /// Custom encounter script appended to the baseline task.
    #[serde(default)]
    pub custom_fight_style: Option<PathBuf>,

    /// Restrict the run to these `<class>_<spec>` ids. Empty means every spec.
    #[serde(default)]
    pub specs: Vec<String>,

    /// How results are mapped back to races.
    #[serde(default)]
    pub resolver: ResolverStrategy,

    #[serde(default)]
    pub backend: BackendSettings,
}

/// Which simulation backend runs the batches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendSettings {
    /// Submit batches to Raidbots instead of a local simc.
    #[serde(default)]
    pub use_raidbots: bool,

    /// Raidbots API key. Required for the remote backend.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_raidbots_url")]
    pub raidbots_url: String,

    /// simc build requested from Raidbots.
    #[serde(default = "default_simc_version")]
    pub simc_version: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-batch timeout. 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Scratch directory for local simc input/output files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Keep local simc input/output files after a batch.
    #[serde(default)]
    pub keep_files: bool,
}

/// The backend a run resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice<'a> {
    Local,
    Raidbots { api_key: &'a str },
}

impl BackendSettings {
    /// Raidbots is only used when requested and a key is present; otherwise
    /// batches run on the local executable.
    pub fn choice(&self) -> BackendChoice<'_> {
        match (self.use_raidbots, self.api_key.as_deref()) {
            (true, Some(key)) if !key.is_empty() => BackendChoice::Raidbots { api_key: key },
            _ => BackendChoice::Local,
        }
    }

    /// Raidbots was requested but `choice` resolves to the local executable.
    pub fn raidbots_unavailable(&self) -> bool {
        self.use_raidbots && self.choice() == BackendChoice::Local
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            use_raidbots: false,
            api_key: None,
            raidbots_url: default_raidbots_url(),
            simc_version: default_simc_version(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: 0,
            work_dir: default_work_dir(),
            keep_files: false,
        }
    }
}

fn default_tier() -> String {
    "TWW1".to_string()
}

fn default_executable() -> PathBuf {
    PathBuf::from("simc")
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_fight_styles() -> Vec<FightStyle> {
    vec![
        FightStyle::new("patchwerk"),
        FightStyle::new("castingpatchwerk"),
        FightStyle::new("hecticaddcleave"),
    ]
}

fn default_target_error() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("patchwerk".to_string(), 0.1),
        ("castingpatchwerk".to_string(), 0.1),
        ("hecticaddcleave".to_string(), 0.2),
    ])
}

fn default_iterations() -> u32 {
    20_000
}

fn default_threads() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

fn default_profileset_work_threads() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_raidbots_url() -> String {
    "https://www.raidbots.com".to_string()
}

fn default_simc_version() -> String {
    "nightly".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("racesim")
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            tier: default_tier(),
            executable: default_executable(),
            profiles_dir: default_profiles_dir(),
            results_dir: default_results_dir(),
            fight_styles: default_fight_styles(),
            target_error: default_target_error(),
            iterations: default_iterations(),
            threads: default_threads(),
            profileset_work_threads: default_profileset_work_threads(),
            ptr: false,
            default_actions: true,
            custom_apl: None,
            custom_fight_style: None,
            specs: Vec::new(),
            resolver: ResolverStrategy::default(),
            backend: BackendSettings::default(),
        }
    }
}

impl SimSettings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: SimSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.fight_styles.is_empty() {
            return Err(RaceSimError::Config(
                "at least one fight style is required".to_string(),
            ));
        }
        for fight_style in &self.fight_styles {
            self.target_error_for(fight_style)?;
        }
        if self.iterations == 0 {
            return Err(RaceSimError::Config(
                "iterations must be greater than zero".to_string(),
            ));
        }
        if self.threads == 0 || self.profileset_work_threads == 0 {
            return Err(RaceSimError::Config(
                "thread counts must be greater than zero".to_string(),
            ));
        }
        if self.backend.use_raidbots && self.backend.poll_interval_secs == 0 {
            return Err(RaceSimError::Config(
                "backend.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Target error configured for `fight_style`.
    pub fn target_error_for(&self, fight_style: &FightStyle) -> Result<f64> {
        self.target_error
            .get(fight_style.as_str())
            .copied()
            .ok_or_else(|| {
                RaceSimError::Config(format!("no target_error configured for {}", fight_style))
            })
    }

    /// Example settings file.
    pub fn example_toml() -> String {
        r#"# racesim settings

tier = "TWW1"
executable = "simc"
profiles_dir = "profiles"
results_dir = "results"
fight_styles = ["patchwerk", "castingpatchwerk", "hecticaddcleave"]
iterations = 20000
threads = 8
profileset_work_threads = 2
ptr = false
default_actions = true

# Optional script fragments appended to the baseline task.
# custom_apl = "custom_apl.txt"
# custom_fight_style = "custom_fight_style.txt"

# Restrict to some specs; omit for all.
# specs = ["shaman_elemental", "mage_fire"]

# "side_table" (default) or "name_match"
resolver = "side_table"

[target_error]
patchwerk = 0.1
castingpatchwerk = 0.1
hecticaddcleave = 0.2

[backend]
use_raidbots = false
# api_key = "..."          # or RAIDBOTS_API_KEY
simc_version = "nightly"
poll_interval_secs = 5
timeout_secs = 0           # 0 = no timeout
keep_files = false
"#
        .to_string()
    }
}
