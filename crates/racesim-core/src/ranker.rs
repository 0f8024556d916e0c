//! Orders resolved results by DPS.

use crate::resolver::ResolvedResult;
use std::collections::BTreeMap;
use tracing::info;

/// Results sorted by descending DPS. Ties keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<'a> {
    entries: Vec<ResolvedResult<'a>>,
}

impl<'a> Ranking<'a> {
    pub fn new(mut entries: Vec<ResolvedResult<'a>>) -> Self {
        // sort_by is stable
        entries.sort_by(|a, b| b.dps.total_cmp(&a.dps));
        Self { entries }
    }

    pub fn entries(&self) -> &[ResolvedResult<'a>] {
        &self.entries
    }

    pub fn winner(&self) -> Option<&ResolvedResult<'a>> {
        self.entries.first()
    }

    /// Names in ranked order; this becomes `sorted_data_keys`.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.to_string()).collect()
    }

    /// Name → DPS rounded to whole numbers.
    pub fn data(&self) -> BTreeMap<String, u64> {
        self.entries
            .iter()
            .map(|e| (e.name.to_string(), e.dps.round().max(0.0) as u64))
            .collect()
    }

    /// Name → language → localized name.
    pub fn translations(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.entries
            .iter()
            .map(|e| (e.name.to_string(), e.translations.clone()))
            .collect()
    }

    pub fn log_winner(&self, spec: &str, fight_style: &str) {
        if let Some(top) = self.winner() {
            info!(spec, fight_style, race = top.name, dps = top.dps, "Top race");
        }
    }
}
