//! End-to-end race simulation runs against the in-memory executor.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use racesim_core::fakes::FakeExecutor;
use racesim_core::{
    Catalog, FightStyle, RaceSimError, RaceSimulation, ReportWriter, ResolverStrategy,
    ResultDocument, SimSettings,
};

const CATALOG: &str = r#"
[[races]]
full_name = "Orc"
simc_name = "orc"
translations = { en_US = "Orc", de_DE = "Orc", fr_FR = "Orc" }

[[races]]
full_name = "Troll"
simc_name = "troll"
translations = { en_US = "Troll", de_DE = "Troll", fr_FR = "Troll" }

[races.sub_variants]
option = "zandalari_loa"
choices = [
    { name = "kimbul", default = true },
    { name = "bwonsamdi" },
    { name = "paku" },
]

[[races]]
full_name = "Dwarf"
simc_name = "dwarf"
translations = { en_US = "Dwarf", de_DE = "Zwerg", fr_FR = "Nain" }

[[classes]]
name = "Shaman"
simc_name = "shaman"
races = ["Orc", "Troll"]
specs = [
    { name = "Elemental", simc_name = "elemental" },
    { name = "Enhancement", simc_name = "enhancement" },
]

[[classes]]
name = "Warrior"
simc_name = "warrior"
races = ["Dwarf", "Orc"]
specs = [{ name = "Fury", simc_name = "fury" }]
"#;

fn write_profile(dir: &Path, class: &str, spec: &str, class_token: &str) {
    let tier_dir = dir.join("TWW1");
    fs::create_dir_all(&tier_dir).unwrap();
    fs::write(
        tier_dir.join(format!("TWW1_{}_{}.simc", class, spec)),
        format!(
            "# baseline\n{}=\"TWW1_{}_{}\"\nlevel=80\nrace=orc\nspec={}\nhead=,id=1\n",
            class_token,
            class,
            spec,
            spec.to_lowercase()
        ),
    )
    .unwrap();
}

fn settings(root: &Path, fight_styles: &[&str]) -> SimSettings {
    SimSettings {
        profiles_dir: root.join("profiles"),
        results_dir: root.join("results"),
        fight_styles: fight_styles.iter().map(|f| FightStyle::new(*f)).collect(),
        target_error: fight_styles.iter().map(|f| (f.to_string(), 0.1)).collect(),
        iterations: 100,
        ..Default::default()
    }
}

fn read_document(path: &Path) -> ResultDocument {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn troll_sub_variants_produce_four_ranked_results() {
    let dir = tempfile::tempdir().unwrap();
    write_profile(&dir.path().join("profiles"), "Shaman", "Elemental", "shaman");
    let settings = SimSettings {
        specs: vec!["shaman_elemental".to_string()],
        ..settings(dir.path(), &["patchwerk"])
    };
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let executor = FakeExecutor::new()
        .with_dps("Orc", 1000.0)
        .with_dps("Troll Kimbul", 1100.0)
        .with_dps("Troll Bwonsamdi", 1050.0)
        .with_dps("Troll Paku", 990.0)
        .with_simc_hash("abcdef0123456789");
    let writer = ReportWriter::new(&settings.results_dir);

    let summary = RaceSimulation::new(&settings, &catalog)
        .run(&executor, &writer)
        .await
        .unwrap();

    assert_eq!(summary.documents_written(), 1);
    let submitted = executor.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(
        submitted[0].task_names,
        vec!["Orc", "Troll Kimbul", "Troll Bwonsamdi", "Troll Paku"]
    );

    let path = &summary.written[0];
    assert!(path.ends_with("races/shaman_elemental_patchwerk.json"));
    let doc = read_document(path);
    assert_eq!(doc.data.len(), 4);
    assert_eq!(
        doc.sorted_data_keys,
        vec!["Troll Kimbul", "Troll Bwonsamdi", "Orc", "Troll Paku"]
    );
    assert_eq!(doc.translations["Troll Paku"]["de_DE"], "Troll Paku");
    assert_eq!(doc.translations["Orc"]["fr_FR"], "Orc");
    assert_eq!(doc.simc_settings.simc_hash.as_deref(), Some("abcdef0123456789"));
    assert!(doc.subtitle.ends_with("| SimC build: abcdef0"));
    assert_eq!(doc.profile.character["level"], "80");
}

#[tokio::test]
async fn sorted_keys_are_a_permutation_of_data() {
    let dir = tempfile::tempdir().unwrap();
    write_profile(&dir.path().join("profiles"), "Warrior", "Fury", "warrior");
    let settings = settings(dir.path(), &["patchwerk", "hecticaddcleave"]);
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let executor = FakeExecutor::new()
        .with_dps("Dwarf", 500.0)
        .with_fallback_dps(500.0);
    let writer = ReportWriter::new(&settings.results_dir);

    let summary = RaceSimulation::new(&settings, &catalog)
        .run(&executor, &writer)
        .await
        .unwrap();
    assert_eq!(summary.documents_written(), 2);

    for path in &summary.written {
        let doc = read_document(path);
        let mut keys = doc.sorted_data_keys.clone();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), doc.sorted_data_keys.len());
        assert_eq!(keys, doc.data.keys().cloned().collect::<Vec<_>>());
        // tie: task order
        assert_eq!(doc.sorted_data_keys, vec!["Dwarf", "Orc"]);
    }
}

#[tokio::test]
async fn missing_profile_skips_spec_and_others_proceed() {
    let dir = tempfile::tempdir().unwrap();
    write_profile(&dir.path().join("profiles"), "Shaman", "Elemental", "shaman");
    write_profile(&dir.path().join("profiles"), "Warrior", "Fury", "warrior");
    let settings = settings(dir.path(), &["patchwerk", "castingpatchwerk"]);
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let executor = FakeExecutor::new().with_fallback_dps(1000.0);
    let writer = ReportWriter::new(&settings.results_dir);

    let summary = RaceSimulation::new(&settings, &catalog)
        .run(&executor, &writer)
        .await
        .unwrap();

    assert_eq!(summary.skipped_specs, vec!["shaman_enhancement"]);
    assert_eq!(summary.documents_written(), 4);
    assert!(executor
        .submitted()
        .iter()
        .all(|b| b.spec_id != "shaman_enhancement"));
    assert!(!writer
        .root()
        .join("shaman_enhancement_patchwerk.json")
        .exists());
}

#[tokio::test]
async fn failing_batch_writes_nothing_and_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    write_profile(&dir.path().join("profiles"), "Warrior", "Fury", "warrior");
    let settings = settings(dir.path(), &["patchwerk", "castingpatchwerk"]);
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let executor = FakeExecutor::new()
        .with_fallback_dps(1000.0)
        .failing_for("patchwerk");
    let writer = ReportWriter::new(&settings.results_dir);

    let summary = RaceSimulation::new(&settings, &catalog)
        .run(&executor, &writer)
        .await
        .unwrap();

    assert_eq!(
        summary.failed_batches,
        vec![("patchwerk".to_string(), "warrior_fury".to_string())]
    );
    assert!(!writer.root().join("warrior_fury_patchwerk.json").exists());
    assert!(writer.root().join("warrior_fury_castingpatchwerk.json").exists());
}

#[tokio::test]
async fn incomplete_results_count_as_failed_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_profile(&dir.path().join("profiles"), "Warrior", "Fury", "warrior");
    let settings = settings(dir.path(), &["patchwerk"]);
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let executor = FakeExecutor::new()
        .with_fallback_dps(1000.0)
        .dropping("Orc");
    let writer = ReportWriter::new(&settings.results_dir);

    let summary = RaceSimulation::new(&settings, &catalog)
        .run(&executor, &writer)
        .await
        .unwrap();

    assert_eq!(summary.failed_batches.len(), 1);
    assert!(summary.written.is_empty());
}

#[tokio::test]
async fn resolver_strategies_write_identical_data() {
    let mut outputs = Vec::new();
    for strategy in [ResolverStrategy::SideTable, ResolverStrategy::NameMatch] {
        let dir = tempfile::tempdir().unwrap();
        write_profile(&dir.path().join("profiles"), "Shaman", "Elemental", "shaman");
        let settings = SimSettings {
            specs: vec!["shaman_elemental".to_string()],
            resolver: strategy,
            ..settings(dir.path(), &["patchwerk"])
        };
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let executor = FakeExecutor::new().with_fallback_dps(750.0);
        let writer = ReportWriter::new(&settings.results_dir);

        let summary = RaceSimulation::new(&settings, &catalog)
            .run(&executor, &writer)
            .await
            .unwrap();
        let doc = read_document(&summary.written[0]);
        outputs.push((doc.data, doc.translations, doc.sorted_data_keys));
    }
    assert_eq!(outputs[0], outputs[1]);
    let translations: &BTreeMap<String, BTreeMap<String, String>> = &outputs[0].1;
    assert_eq!(translations["Troll Bwonsamdi"]["en_US"], "Troll Bwonsamdi");
}

#[test]
fn plan_builds_batches_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    write_profile(&dir.path().join("profiles"), "Warrior", "Fury", "warrior");
    let settings = settings(dir.path(), &["patchwerk", "castingpatchwerk"]);
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();

    let batches = RaceSimulation::new(&settings, &catalog).plan().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].fight_style().as_str(), "patchwerk");
    assert_eq!(batches[1].fight_style().as_str(), "castingpatchwerk");
    assert_eq!(batches[0].task_names().collect::<Vec<_>>(), vec!["Dwarf", "Orc"]);
    assert!(!settings.results_dir.exists());
}

#[tokio::test]
async fn unknown_spec_selection_halts() {
    let dir = tempfile::tempdir().unwrap();
    let settings = SimSettings {
        specs: vec!["paladin_holy".to_string()],
        ..settings(dir.path(), &["patchwerk"])
    };
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let executor = FakeExecutor::new();
    let writer = ReportWriter::new(&settings.results_dir);

    let err = RaceSimulation::new(&settings, &catalog)
        .run(&executor, &writer)
        .await
        .unwrap_err();
    assert!(matches!(err, RaceSimError::UnknownSpec(id) if id == "paladin_holy"));
}
