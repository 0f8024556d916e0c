//! Maps results back to the races that produced them.
//!
//! Two strategies give identical output:
//!
//! - `SideTable` reads the origin the batch builder recorded for each task.
//! - `NameMatch` parses display names: an exact full-name match, or a full
//!   name followed by one sub-variant token (`"Zandalari Troll Bwonsamdi"`).
//!
//! Results of a race with sub-variants get the sub-variant label appended to
//! every localized name, since translation tables only hold one name per race.

use crate::batch::Batch;
use crate::catalog::RaceVariant;
use crate::error::{RaceSimError, Result};
use crate::executor::TaskResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
    #[default]
    SideTable,
    NameMatch,
}

/// A race matched to a display name, with the sub-variant label if the name
/// carried one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceMatch<'a> {
    pub race: &'a RaceVariant,
    pub sub_variant: Option<&'a str>,
}

/// A result paired with its race and localized names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResult<'a> {
    pub name: &'a str,
    pub dps: f64,
    pub race: &'a RaceVariant,
    pub translations: BTreeMap<String, String>,
}

/// Find the race owning `name` by parsing it.
///
/// Every candidate is checked; an exact match wins over a composite one.
pub fn match_race<'a>(name: &'a str, races: &'a [RaceVariant]) -> Option<RaceMatch<'a>> {
    let mut composite = None;
    for race in races {
        if race.full_name == name {
            return Some(RaceMatch {
                race,
                sub_variant: None,
            });
        }
        let suffix = name
            .strip_prefix(race.full_name.as_str())
            .and_then(|rest| rest.strip_prefix(' '))
            .filter(|label| !label.is_empty() && !label.contains(' '));
        if let Some(label) = suffix {
            composite = Some(RaceMatch {
                race,
                sub_variant: Some(label),
            });
        }
    }
    composite
}

/// Localized names for a result, suffixed with the sub-variant label if any.
pub fn localized_names(
    race: &RaceVariant,
    sub_variant: Option<&str>,
) -> BTreeMap<String, String> {
    race.translations
        .iter()
        .map(|(language, localized)| {
            let name = match sub_variant {
                Some(label) => format!("{} {}", localized, label),
                None => localized.clone(),
            };
            (language.clone(), name)
        })
        .collect()
}

fn owner_from_side_table<'a>(
    batch: &'a Batch,
    name: &str,
) -> Option<(&'a RaceVariant, Option<String>)> {
    let origin = batch.origin_of(name)?;
    let race = batch.races().get(origin.race)?;
    let label = origin.sub_variant.and_then(|index| {
        race.sub_variants
            .as_ref()
            .and_then(|set| set.choices.get(index))
            .map(|choice| choice.title())
    });
    Some((race, label))
}

/// Resolve every result to its race.
///
/// An unmatched name is an invariant violation and fails the whole call.
pub fn resolve<'a>(
    batch: &'a Batch,
    results: &'a [TaskResult],
    strategy: ResolverStrategy,
) -> Result<Vec<ResolvedResult<'a>>> {
    results
        .iter()
        .map(|result| {
            let unmatched = || RaceSimError::UnmatchedResult {
                name: result.name.clone(),
            };
            let (race, translations) = match strategy {
                ResolverStrategy::SideTable => {
                    let (race, label) =
                        owner_from_side_table(batch, &result.name).ok_or_else(unmatched)?;
                    (race, localized_names(race, label.as_deref()))
                }
                ResolverStrategy::NameMatch => {
                    let found = match_race(&result.name, batch.races()).ok_or_else(unmatched)?;
                    (found.race, localized_names(found.race, found.sub_variant))
                }
            };
            Ok(ResolvedResult {
                name: &result.name,
                dps: result.dps,
                race,
                translations,
            })
        })
        .collect()
}
