//! Sub-variant expansion.
//!
//! A race with a sub-variant set turns into one base task plus one task per
//! explicit choice. The base task stands for the default choice: it carries
//! that choice's override and its display name gets the choice's suffix, so
//! the plain race never appears as a "no choice" entry.

use crate::catalog::RaceVariant;

/// Name and overrides of one task derived from a race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTask {
    pub name: String,
    pub overrides: Vec<String>,
    /// Index into the race's sub-variant choices.
    pub sub_variant: Option<usize>,
}

/// Expand `race` into its tasks. The first entry is always the base task.
pub fn expand(race: &RaceVariant) -> Vec<VariantTask> {
    let base_override = race.race_override();
    let Some(set) = race.sub_variants.as_ref().filter(|s| !s.choices.is_empty()) else {
        return vec![VariantTask {
            name: race.full_name.clone(),
            overrides: vec![base_override],
            sub_variant: None,
        }];
    };

    let default = set.default_index();
    let mut tasks = Vec::with_capacity(set.choices.len() + 1);

    let mut base = VariantTask {
        name: race.full_name.clone(),
        overrides: vec![base_override.clone()],
        sub_variant: None,
    };
    if let Some(index) = default {
        base.name = format!("{} {}", race.full_name, set.choices[index].title());
        base.overrides.extend(set.override_for(index));
        base.sub_variant = Some(index);
    }
    tasks.push(base);

    for (index, choice) in set.choices.iter().enumerate() {
        if Some(index) == default {
            continue;
        }
        let mut overrides = vec![base_override.clone()];
        overrides.extend(set.override_for(index));
        tasks.push(VariantTask {
            name: format!("{} {}", race.full_name, choice.title()),
            overrides,
            sub_variant: Some(index),
        });
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SubVariant, SubVariantSet};

    fn zandalari(default: bool) -> RaceVariant {
        let kimbul = if default {
            SubVariant::default_choice("kimbul")
        } else {
            SubVariant::new("kimbul")
        };
        RaceVariant::new("Zandalari Troll", "zandalari_troll").with_sub_variants(
            SubVariantSet::new(
                "zandalari_loa",
                vec![kimbul, SubVariant::new("bwonsamdi"), SubVariant::new("paku")],
            ),
        )
    }

    #[test]
    fn test_plain_race_single_task() {
        let tasks = expand(&RaceVariant::new("Orc", "orc"));
        assert_eq!(
            tasks,
            vec![VariantTask {
                name: "Orc".to_string(),
                overrides: vec!["race=orc".to_string()],
                sub_variant: None,
            }]
        );
    }

    #[test]
    fn test_default_choice_folds_into_base_task() {
        let tasks = expand(&zandalari(true));
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Zandalari Troll Kimbul",
                "Zandalari Troll Bwonsamdi",
                "Zandalari Troll Paku"
            ]
        );
        assert_eq!(
            tasks[0].overrides,
            vec!["race=zandalari_troll", "zandalari_loa=kimbul"]
        );
        assert_eq!(
            tasks[2].overrides,
            vec!["race=zandalari_troll", "zandalari_loa=paku"]
        );
        assert_eq!(tasks[0].sub_variant, Some(0));
        assert_eq!(tasks[2].sub_variant, Some(2));
    }

    #[test]
    fn test_without_default_every_choice_is_explicit() {
        let tasks = expand(&zandalari(false));
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[0].name, "Zandalari Troll");
        assert_eq!(tasks[0].overrides, vec!["race=zandalari_troll"]);
        assert_eq!(tasks[0].sub_variant, None);
        assert_eq!(tasks[1].name, "Zandalari Troll Kimbul");
    }

    #[test]
    fn test_default_need_not_be_first() {
        let race = RaceVariant::new("Troll", "troll").with_sub_variants(SubVariantSet::new(
            "loa",
            vec![SubVariant::new("bwonsamdi"), SubVariant::default_choice("kimbul")],
        ));
        let tasks = expand(&race);
        assert_eq!(tasks[0].name, "Troll Kimbul");
        assert_eq!(tasks[1].name, "Troll Bwonsamdi");
        assert_eq!(tasks.len(), 2);
    }
}
