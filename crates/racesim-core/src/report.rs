//! Result documents and their on-disk form.

use crate::catalog::SpecRef;
use crate::error::Result;
use crate::profile::ProfileSummary;
use crate::ranker::Ranking;
use crate::settings::FightStyle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Run parameters recorded in a result document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimcSettingsMeta {
    pub class: String,
    pub spec: String,
    pub fight_style: String,
    pub tier: String,
    pub iterations: u32,
    pub target_error: f64,
    pub ptr: bool,
    pub simc_hash: Option<String>,
}

/// One race comparison for a class, spec and fight style.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultDocument {
    pub data_type: String,
    pub timestamp: String,
    pub title: String,
    pub subtitle: String,
    pub simc_settings: SimcSettingsMeta,
    pub profile: ProfileSummary,
    pub data: BTreeMap<String, u64>,
    pub translations: BTreeMap<String, BTreeMap<String, String>>,
    pub sorted_data_keys: Vec<String>,
}

impl ResultDocument {
    pub fn new(
        spec: SpecRef<'_>,
        fight_style: &FightStyle,
        meta: SimcSettingsMeta,
        profile: ProfileSummary,
        ranking: &Ranking<'_>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let timestamp = generated_at.format("%Y-%m-%d %H:%M").to_string();
        let mut subtitle = format!("UTC {}", timestamp);
        if let Some(hash) = &meta.simc_hash {
            let short: String = hash.chars().take(7).collect();
            subtitle.push_str(&format!(" | SimC build: {}", short));
        }

        Self {
            data_type: "races".to_string(),
            title: format!("Races | {} | {}", spec, fight_style.title()),
            subtitle,
            timestamp,
            simc_settings: meta,
            profile,
            data: ranking.data(),
            translations: ranking.translations(),
            sorted_data_keys: ranking.keys(),
        }
    }

    /// Pretty JSON: 4-space indent, keys sorted, non-ASCII kept literal.
    pub fn to_pretty_json(&self) -> Result<String> {
        // Value maps are BTreeMaps, so going through Value sorts struct keys too.
        let value = serde_json::to_value(self)?;
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Writes documents under `<results_dir>/races/`.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    root: PathBuf,
}

impl ReportWriter {
    /// `results_dir` is the results root; documents go in its `races` subdirectory.
    pub fn new(results_dir: impl AsRef<Path>) -> Self {
        Self {
            root: results_dir.as_ref().join("races"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, spec: SpecRef<'_>, fight_style: &FightStyle) -> PathBuf {
        self.root.join(format!(
            "{}_{}_{}.json",
            spec.class.simc_name,
            spec.spec.simc_name,
            fight_style.file_stem()
        ))
    }

    /// Atomically write `document`, replacing any previous file.
    pub fn write(
        &self,
        document: &ResultDocument,
        spec: SpecRef<'_>,
        fight_style: &FightStyle,
    ) -> Result<PathBuf> {
        let path = self.path_for(spec, fight_style);
        let json = document.to_pretty_json()?;

        fs::create_dir_all(&self.root)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), bytes = json.len(), "Wrote result document");
        Ok(path)
    }
}
