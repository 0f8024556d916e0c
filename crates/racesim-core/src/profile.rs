//! Baseline profile lookup and parsing.

use crate::catalog::SpecRef;
use crate::error::{RaceSimError, Result};
use crate::settings::SimSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CHARACTER_KEYS: &[&str] = &[
    "level", "race", "region", "server", "role", "position", "talents", "spec",
];

const ITEM_SLOTS: &[&str] = &[
    "head", "neck", "shoulder", "shoulders", "back", "chest", "shirt", "tabard", "wrist",
    "wrists", "hands", "waist", "legs", "feet", "finger1", "finger2", "trinket1", "trinket2",
    "main_hand", "off_hand",
];

/// Finds baseline profiles under `<profiles_dir>/<tier>/`.
#[derive(Debug, Clone)]
pub struct ProfileLocator {
    profiles_dir: PathBuf,
    tier: String,
}

impl ProfileLocator {
    pub fn new(profiles_dir: impl Into<PathBuf>, tier: impl Into<String>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
            tier: tier.into(),
        }
    }

    pub fn from_settings(settings: &SimSettings) -> Self {
        Self::new(&settings.profiles_dir, &settings.tier)
    }

    /// `<dir>/<tier>/<tier>_<Class_Name>_<Spec_Name>.simc`
    pub fn path(&self, spec: SpecRef<'_>) -> PathBuf {
        let file = format!(
            "{}_{}_{}.simc",
            self.tier,
            spec.class.name.replace(' ', "_"),
            spec.spec.name.replace(' ', "_")
        );
        self.profiles_dir.join(&self.tier).join(file)
    }

    pub fn exists(&self, spec: SpecRef<'_>) -> bool {
        self.path(spec).is_file()
    }

    pub fn load(&self, spec: SpecRef<'_>) -> Result<BaselineProfile> {
        let path = self.path(spec);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(BaselineProfile::new(path, content, &spec.class.simc_name)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RaceSimError::ProfileNotFound(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// The baseline character every task in a batch is simulated against.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineProfile {
    path: PathBuf,
    content: String,
    summary: ProfileSummary,
}

/// Character and gear lines extracted from a profile, for result documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileSummary {
    pub character: BTreeMap<String, String>,
    pub items: BTreeMap<String, String>,
}

impl BaselineProfile {
    /// `class_simc_name` identifies the `<class>="<name>"` header line.
    pub fn new(path: impl Into<PathBuf>, content: String, class_simc_name: &str) -> Self {
        let summary = parse_summary(&content, class_simc_name);
        Self {
            path: path.into(),
            content,
            summary,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn summary(&self) -> &ProfileSummary {
        &self.summary
    }
}

fn parse_summary(content: &str, class_simc_name: &str) -> ProfileSummary {
    // simc spells some class tokens without underscores (deathknight).
    let class_key = class_simc_name.replace('_', "");
    let mut summary = ProfileSummary::default();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"');

        if key.replace('_', "") == class_key && !summary.character.contains_key("class") {
            summary
                .character
                .insert("class".to_string(), class_simc_name.to_string());
            summary
                .character
                .insert("name".to_string(), value.to_string());
        } else if CHARACTER_KEYS.contains(&key) {
            summary.character.insert(key.to_string(), value.to_string());
        } else if ITEM_SLOTS.contains(&key) {
            summary.items.insert(key.to_string(), value.to_string());
        }
    }
    summary
}
