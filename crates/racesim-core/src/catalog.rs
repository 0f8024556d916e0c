//! Game reference data: races, classes and specs.
//!
//! The catalog is loaded once from TOML and treated as read-only for the rest
//! of the run. Classes reference their playable races by full name, in the
//! order the batch should use (the first race becomes the baseline task).

use crate::error::{RaceSimError, Result};
use crate::variants;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Capitalize the first letter of every alphabetic run and lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// A selectable character race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RaceVariant {
    /// Display name, unique within the catalog (e.g. `Zandalari Troll`).
    pub full_name: String,

    /// simc race token (e.g. `zandalari_troll`).
    pub simc_name: String,

    /// Language code to localized race name.
    #[serde(default)]
    pub translations: BTreeMap<String, String>,

    /// Secondary choices only this race has (e.g. loa).
    #[serde(default)]
    pub sub_variants: Option<SubVariantSet>,
}

impl RaceVariant {
    pub fn new(full_name: impl Into<String>, simc_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            simc_name: simc_name.into(),
            translations: BTreeMap::new(),
            sub_variants: None,
        }
    }

    pub fn with_translation(mut self, language: &str, name: &str) -> Self {
        self.translations
            .insert(language.to_string(), name.to_string());
        self
    }

    pub fn with_sub_variants(mut self, set: SubVariantSet) -> Self {
        self.sub_variants = Some(set);
        self
    }

    /// The simc override selecting this race.
    pub fn race_override(&self) -> String {
        format!("race={}", self.simc_name)
    }

    pub fn has_sub_variants(&self) -> bool {
        self.sub_variants
            .as_ref()
            .is_some_and(|set| !set.choices.is_empty())
    }
}

/// The secondary choices of a race, e.g. Zandalari loa.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubVariantSet {
    /// simc option key (e.g. `zandalari_loa`).
    pub option: String,

    /// Choices in task order.
    pub choices: Vec<SubVariant>,
}

impl SubVariantSet {
    pub fn new(option: impl Into<String>, choices: Vec<SubVariant>) -> Self {
        Self {
            option: option.into(),
            choices,
        }
    }

    /// Index of the choice the plain race name stands for, if any.
    pub fn default_index(&self) -> Option<usize> {
        self.choices.iter().position(|c| c.default)
    }

    /// The simc override for choice `index`.
    pub fn override_for(&self, index: usize) -> Option<String> {
        self.choices
            .get(index)
            .map(|choice| format!("{}={}", self.option, choice.name))
    }
}

/// One secondary choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubVariant {
    /// simc value (e.g. `kimbul`).
    pub name: String,

    /// Whether the un-suffixed race task uses this choice.
    #[serde(default)]
    pub default: bool,
}

impl SubVariant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: false,
        }
    }

    pub fn default_choice(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: true,
        }
    }

    /// Label appended to display names, e.g. `Bwonsamdi`.
    pub fn title(&self) -> String {
        title_case(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WowSpec {
    pub name: String,
    pub simc_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WowClass {
    pub name: String,
    pub simc_name: String,

    /// Playable races by full name; the first one is the baseline.
    pub races: Vec<String>,

    pub specs: Vec<WowSpec>,
}

/// A class/spec pair borrowed from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecRef<'a> {
    pub class: &'a WowClass,
    pub spec: &'a WowSpec,
}

impl SpecRef<'_> {
    /// `<class>_<spec>` id, e.g. `shaman_elemental`.
    pub fn id(&self) -> String {
        format!("{}_{}", self.class.simc_name, self.spec.simc_name)
    }
}

impl fmt::Display for SpecRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.spec.name, self.class.name)
    }
}

/// Races and classes known to the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub races: Vec<RaceVariant>,

    #[serde(default)]
    pub classes: Vec<WowClass>,
}

impl Catalog {
    /// Parse and validate a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for race in &self.races {
            if !names.insert(race.full_name.as_str()) {
                return Err(RaceSimError::Catalog(format!(
                    "duplicate race '{}'",
                    race.full_name
                )));
            }
            if let Some(set) = &race.sub_variants {
                if set.choices.iter().filter(|c| c.default).count() > 1 {
                    return Err(RaceSimError::Catalog(format!(
                        "race '{}' has more than one default {}",
                        race.full_name, set.option
                    )));
                }
                // simc option values are single tokens
                if let Some(choice) = set
                    .choices
                    .iter()
                    .find(|c| c.name.is_empty() || c.name.contains(char::is_whitespace))
                {
                    return Err(RaceSimError::Catalog(format!(
                        "race '{}' has invalid {} choice '{}'",
                        race.full_name, set.option, choice.name
                    )));
                }
            }
        }

        for class in &self.classes {
            if class.races.is_empty() {
                return Err(RaceSimError::Catalog(format!(
                    "class '{}' has no races",
                    class.name
                )));
            }
            if let Some(missing) = class.races.iter().find(|r| !names.contains(r.as_str())) {
                return Err(RaceSimError::Catalog(format!(
                    "class '{}' references unknown race '{}'",
                    class.name, missing
                )));
            }

            let mut task_names = HashSet::new();
            for race in self.races_for(class)? {
                for task in variants::expand(&race) {
                    if !task_names.insert(task.name.clone()) {
                        return Err(RaceSimError::Catalog(format!(
                            "class '{}' yields duplicate task name '{}'",
                            class.name, task.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn race(&self, full_name: &str) -> Option<&RaceVariant> {
        self.races.iter().find(|r| r.full_name == full_name)
    }

    /// The class's races in batch order.
    pub fn races_for(&self, class: &WowClass) -> Result<Vec<RaceVariant>> {
        class
            .races
            .iter()
            .map(|name| {
                self.race(name).cloned().ok_or_else(|| {
                    RaceSimError::Catalog(format!(
                        "class '{}' references unknown race '{}'",
                        class.name, name
                    ))
                })
            })
            .collect()
    }

    /// Every class/spec pair in catalog order.
    pub fn specs(&self) -> impl Iterator<Item = SpecRef<'_>> {
        self.classes
            .iter()
            .flat_map(|class| class.specs.iter().map(move |spec| SpecRef { class, spec }))
    }

    /// Specs selected by `<class>_<spec>` ids; all specs when `ids` is empty.
    pub fn select_specs(&self, ids: &[String]) -> Result<Vec<SpecRef<'_>>> {
        if ids.is_empty() {
            return Ok(self.specs().collect());
        }
        if let Some(unknown) = ids
            .iter()
            .find(|id| !self.specs().any(|spec| &spec.id() == *id))
        {
            return Err(RaceSimError::UnknownSpec(unknown.clone()));
        }
        Ok(self
            .specs()
            .filter(|spec| ids.contains(&spec.id()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[races]]
full_name = "Orc"
simc_name = "orc"
translations = { en_US = "Orc", de_DE = "Orc" }

[[races]]
full_name = "Zandalari Troll"
simc_name = "zandalari_troll"
translations = { en_US = "Zandalari Troll", de_DE = "Zandalari-Troll" }

[races.sub_variants]
option = "zandalari_loa"
choices = [
    { name = "kimbul", default = true },
    { name = "bwonsamdi" },
    { name = "paku" },
]

[[classes]]
name = "Shaman"
simc_name = "shaman"
races = ["Orc", "Zandalari Troll"]
specs = [
    { name = "Elemental", simc_name = "elemental" },
    { name = "Enhancement", simc_name = "enhancement" },
]
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_toml_str(CATALOG).expect("parse");
        assert_eq!(catalog.races.len(), 2);

        let troll = catalog.race("Zandalari Troll").expect("troll");
        assert!(troll.has_sub_variants());
        let set = troll.sub_variants.as_ref().unwrap();
        assert_eq!(set.default_index(), Some(0));
        assert_eq!(set.override_for(2).as_deref(), Some("zandalari_loa=paku"));
        assert_eq!(troll.translations["de_DE"], "Zandalari-Troll");
    }

    #[test]
    fn test_races_for_keeps_class_order() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let races = catalog.races_for(&catalog.classes[0]).unwrap();
        let names: Vec<_> = races.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["Orc", "Zandalari Troll"]);
    }

    #[test]
    fn test_select_specs() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.select_specs(&[]).unwrap().len(), 2);

        let selected = catalog
            .select_specs(&["shaman_enhancement".to_string()])
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].to_string(), "Enhancement Shaman");

        match catalog.select_specs(&["mage_fire".to_string()]) {
            Err(RaceSimError::UnknownSpec(id)) => assert_eq!(id, "mage_fire"),
            other => panic!("expected UnknownSpec, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_race_reference_rejected() {
        let toml = r#"
[[classes]]
name = "Mage"
simc_name = "mage"
races = ["Gnome"]
specs = []
"#;
        assert!(matches!(
            Catalog::from_toml_str(toml),
            Err(RaceSimError::Catalog(_))
        ));
    }

    #[test]
    fn test_two_defaults_rejected() {
        let race = RaceVariant::new("Zandalari Troll", "zandalari_troll").with_sub_variants(
            SubVariantSet::new(
                "zandalari_loa",
                vec![
                    SubVariant::default_choice("kimbul"),
                    SubVariant::default_choice("paku"),
                ],
            ),
        );
        let catalog = Catalog {
            races: vec![race],
            classes: vec![],
        };
        assert!(catalog.validate().is_err());
    }

    fn class_with(races: &[&str]) -> WowClass {
        WowClass {
            name: "Warrior".to_string(),
            simc_name: "warrior".to_string(),
            races: races.iter().map(|r| r.to_string()).collect(),
            specs: vec![WowSpec {
                name: "Fury".to_string(),
                simc_name: "fury".to_string(),
            }],
        }
    }

    #[test]
    fn test_repeated_class_race_rejected() {
        let catalog = Catalog {
            races: vec![RaceVariant::new("Orc", "orc")],
            classes: vec![class_with(&["Orc", "Orc"])],
        };
        match catalog.validate() {
            Err(RaceSimError::Catalog(msg)) => assert!(msg.contains("'Orc'"), "{msg}"),
            other => panic!("expected Catalog error, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_choice_rejected() {
        let troll = RaceVariant::new("Troll", "troll").with_sub_variants(SubVariantSet::new(
            "troll_loa",
            vec![SubVariant::new("paku"), SubVariant::new("paku")],
        ));
        let catalog = Catalog {
            races: vec![troll],
            classes: vec![class_with(&["Troll"])],
        };
        assert!(matches!(catalog.validate(), Err(RaceSimError::Catalog(_))));
    }

    #[test]
    fn test_choice_colliding_with_race_rejected() {
        let troll = RaceVariant::new("Troll", "troll").with_sub_variants(SubVariantSet::new(
            "troll_loa",
            vec![SubVariant::new("kin")],
        ));
        let catalog = Catalog {
            races: vec![troll, RaceVariant::new("Troll Kin", "troll_kin")],
            classes: vec![class_with(&["Troll", "Troll Kin"])],
        };
        assert!(matches!(catalog.validate(), Err(RaceSimError::Catalog(_))));

        // fine as long as no class lists both
        let catalog = Catalog {
            classes: vec![class_with(&["Troll"])],
            ..catalog
        };
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_choice_with_whitespace_rejected() {
        let toml = r#"
[[races]]
full_name = "Troll"
simc_name = "troll"

[races.sub_variants]
option = "troll_loa"
choices = [{ name = "big paku" }]
"#;
        match Catalog::from_toml_str(toml) {
            Err(RaceSimError::Catalog(msg)) => assert!(msg.contains("big paku"), "{msg}"),
            other => panic!("expected Catalog error, got {other:?}"),
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("bwonsamdi"), "Bwonsamdi");
        assert_eq!(title_case("gonk"), "Gonk");
        assert_eq!(title_case("hecticaddcleave"), "Hecticaddcleave");
        assert_eq!(title_case("two words"), "Two Words");
    }
}
