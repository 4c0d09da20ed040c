//! Integration tests for catalog construction from plugin trees

mod helpers;

use codriver_mapper::catalog::{build_catalog, CatalogPolicy};
use codriver_mapper::config_tree::DeclKind;
use codriver_mapper::DiagnosticKind;
use helpers::{write_file, write_plugin, PluginContents};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn ini_files() -> Vec<String> {
    vec!["Rbr.ini".to_string()]
}

#[test]
fn test_plugin_tree_builds_catalog() {
    let temp = TempDir::new().unwrap();
    let dir = write_plugin(
        temp.path(),
        "janne",
        &PluginContents {
            extra_details: "",
            sounds: &["one_left.ogg", "one_right.ogg", "into.ogg", "finish.ogg", "100.ogg"],
        },
    );

    let (catalog, log) = build_catalog("numeric", &dir, &ini_files(), CatalogPolicy::default(), BTreeMap::new());

    assert_eq!(catalog.len(), 5);
    assert!(log.is_empty(), "unexpected problems: {:?}", log.entries());

    let one_left = catalog.by_id(0)[0];
    assert_eq!(one_left.category.as_deref(), Some("Corners"));
    assert_eq!(one_left.package.as_deref(), Some("Standard"));
    assert_eq!(one_left.origin_file, "corners.ini");
    assert_eq!(one_left.translation, "one left");
    assert_eq!(one_left.sounds_dir, dir.join("sounds").join("default"));

    let range = catalog.by_name("100")[0];
    assert_eq!(range.kind, DeclKind::Range);
    assert_eq!(range.id, None);
    assert_eq!(range.translation, "100");
    assert_eq!(range.package.as_deref(), Some("Ranges"));
}

#[test]
fn test_round_trip_lookup() {
    let temp = TempDir::new().unwrap();
    let dir = write_plugin(
        temp.path(),
        "janne",
        &PluginContents {
            extra_details: "",
            sounds: &[],
        },
    );
    let (catalog, _) = build_catalog("numeric", &dir, &ini_files(), CatalogPolicy::default(), BTreeMap::new());

    assert!(!catalog.is_empty());
    for note in catalog.all_notes() {
        if let Some(id) = note.id {
            assert!(catalog.by_id(id).iter().any(|n| *n == note), "by_id({}) misses {}", id, note.name);
        }
        let upper = note.name.to_uppercase();
        assert!(catalog.by_name(&upper).iter().any(|n| *n == note), "by_name misses {}", note.name);
    }
}

#[test]
fn test_missing_sounds_are_kept_visible() {
    let temp = TempDir::new().unwrap();
    let dir = write_plugin(
        temp.path(),
        "janne",
        &PluginContents {
            extra_details: "",
            sounds: &["one_left.ogg"],
        },
    );
    let (catalog, log) = build_catalog("numeric", &dir, &ini_files(), CatalogPolicy::default(), BTreeMap::new());

    let finish = catalog.by_id(22)[0];
    assert_eq!(finish.sound_files, vec!["finish.ogg"]);
    assert!(finish.is_sound_missing("finish.ogg"));
    assert!(catalog.by_id(0)[0].has_available_sound());
    assert_eq!(log.count(DiagnosticKind::MissingSound), 4);
}

#[test]
fn test_conflicting_translation_keeps_first_note() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("plugin");
    write_file(&dir, "PaceNote.ini", "[SETTINGS]\nsounds=default\nlanguage=english\n");
    write_file(
        &dir,
        "config/pacenotes/Rbr.ini",
        "[CATEGORY::Corners]\nfile0=a.ini\nfile1=b.ini\n",
    );
    let note = "[PACENOTE::ONE_LEFT]\nid=0\nSounds=1\nSnd0=one_left.ogg\n";
    write_file(&dir, "config/pacenotes/a.ini", note);
    write_file(&dir, "config/pacenotes/b.ini", note);
    write_file(
        &dir,
        "language/english/pacenotes/packages/corners/a.ini",
        "[STRINGS]\none_left=one left\n",
    );
    write_file(
        &dir,
        "language/english/pacenotes/packages/corners/b.ini",
        "[STRINGS]\none_left=left one\n",
    );
    write_file(&dir, "sounds/default/one_left.ogg", "");

    let (catalog, log) = build_catalog("numeric", &dir, &ini_files(), CatalogPolicy::default(), BTreeMap::new());

    assert_eq!(log.count(DiagnosticKind::Conflict), 1);
    assert_eq!(catalog.len(), 1);
    let stored = catalog.by_id(0)[0];
    assert_eq!(stored.translation, "one left");
    assert_eq!(stored.origin_file, "a.ini");
}

#[test]
fn test_sound_count_mismatch_still_inserts() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("plugin");
    write_file(&dir, "PaceNote.ini", "[SETTINGS]\nsounds=default\nlanguage=english\n");
    write_file(
        &dir,
        "config/pacenotes/Rbr.ini",
        "[PACENOTE::TWO_LEFT]\nid=1\nSounds=2\nSnd0=two_left.ogg\n",
    );
    write_file(&dir, "language/english/pacenotes/strings.ini", "[STRINGS]\ntwo_left=two left\n");
    write_file(&dir, "sounds/default/two_left.ogg", "");

    let (catalog, log) = build_catalog("numeric", &dir, &ini_files(), CatalogPolicy::default(), BTreeMap::new());

    assert_eq!(log.count(DiagnosticKind::SoundCountMismatch), 1);
    assert_eq!(log.count_by_severity().0, 1);
    let note = catalog.by_id(1)[0];
    assert_eq!(note.sound_files, vec!["two_left.ogg"]);
    assert_eq!(note.declared_sounds, 2);
}

#[test]
fn test_file_redirection_is_recorded() {
    let temp = TempDir::new().unwrap();
    let dir = write_plugin(
        temp.path(),
        "janne",
        &PluginContents {
            extra_details: "",
            sounds: &["one_left_v2.ogg"],
        },
    );
    let mut renames = BTreeMap::new();
    renames.insert("one_left.ogg".to_string(), "one_left_v2.ogg".to_string());

    let (catalog, _) = build_catalog("numeric", &dir, &ini_files(), CatalogPolicy::default(), renames);

    let note = catalog.by_id(0)[0];
    assert_eq!(note.sound_files, vec!["one_left_v2.ogg"]);
    assert_eq!(note.renamed_from("one_left_v2.ogg"), Some("one_left.ogg"));
    assert!(note.has_available_sound());
}

#[test]
fn test_missing_plugin_dir_yields_empty_catalog() {
    let temp = TempDir::new().unwrap();
    let (catalog, log) = build_catalog(
        "numeric",
        &temp.path().join("absent"),
        &ini_files(),
        CatalogPolicy::default(),
        BTreeMap::new(),
    );
    assert!(catalog.is_empty());
    assert_eq!(log.count(DiagnosticKind::MissingFile), 1);
}
