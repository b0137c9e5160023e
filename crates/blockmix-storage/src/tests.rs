//! Storage tests against a temporary directory.

use super::*;
use blockmix_core::{ExactNameResolver, PropertyMap, ReplacementSet, StructureType};
use tempfile::tempdir;

fn props(pairs: &[(&str, &[&str])]) -> PropertyMap {
    pairs
        .iter()
        .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
        .collect()
}

/// Helper to create a store with a few blocks already on disk.
fn seeded_store() -> (CatalogStore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let config = StorageConfig {
        catalog_path: dir.path().join("blocks.json"),
        pretty: true,
    };
    let mut store = CatalogStore::empty(&config);
    store.add("stone", PropertyMap::new()).unwrap();
    store
        .add("stone_brick_slab", props(&[("half", &["bottom", "top"])]))
        .unwrap();
    store
        .add("cobblestone_slab", props(&[("half", &["bottom", "top"])]))
        .unwrap();
    (store, dir)
}

#[test]
fn test_mutations_survive_reopen() {
    let (mut store, _dir) = seeded_store();
    store
        .update("stone", props(&[("variant", &["smooth"])]))
        .unwrap();
    assert!(store.remove("cobblestone_slab").unwrap());

    let reopened = CatalogStore::load(store.path()).unwrap();
    assert_eq!(reopened.catalog(), store.catalog());
    assert!(!reopened.catalog().contains("cobblestone_slab"));
    assert_eq!(
        reopened.catalog().get("stone").unwrap().domain("variant").unwrap(),
        ["smooth"]
    );
}

#[test]
fn test_unsorted_catalog_keeps_file_order_through_edits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blocks.json");
    std::fs::write(
        &path,
        r#"{
  "zinc_block": {},
  "andesite": {},
  "oak_stairs": { "waterlogged": ["false", "true"], "facing": ["north", "east"] }
}"#,
    )
    .unwrap();

    let mut store = CatalogStore::load(&path).unwrap();
    let set = ReplacementSet::new(store.catalog(), StructureType::NormalBlock);
    assert_eq!(set.candidates(), ["zinc_block", "andesite"]);

    store.add("birch_planks", PropertyMap::new()).unwrap();
    let reopened = CatalogStore::load(&path).unwrap();
    let ids: Vec<&str> = reopened.catalog().ids().collect();
    assert_eq!(ids, ["zinc_block", "andesite", "oak_stairs", "birch_planks"]);
    let keys: Vec<&str> = reopened.catalog().get("oak_stairs").unwrap().keys().collect();
    assert_eq!(keys, ["waterlogged", "facing"]);

    let text = std::fs::read_to_string(&path).unwrap();
    let zinc = text.find("zinc_block").unwrap();
    let andesite = text.find("andesite").unwrap();
    assert!(zinc < andesite, "file was reordered: {text}");
}

#[test]
fn test_add_with_unusable_id_leaves_file_untouched() {
    let (mut store, _dir) = seeded_store();
    let before = std::fs::read_to_string(store.path()).unwrap();
    let err = store.add("a,b", PropertyMap::new()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Catalog(blockmix_core::ReplaceError::InvalidBlockId(_))
    ));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[test]
fn test_catalog_file_with_unusable_id_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blocks.json");
    std::fs::write(&path, r#"{ "stone": {}, "stone[x": {} }"#).unwrap();
    let (store, err) = CatalogStore::load_or_empty(&path);
    assert!(store.catalog().is_empty());
    assert!(matches!(err, Some(StorageError::MalformedCatalog { .. })));
}

#[test]
fn test_catalog_is_written_with_two_space_indent() {
    let (store, _dir) = seeded_store();
    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.starts_with("{\n  \""), "got: {text}");
    assert!(text.contains("\"stone\": {}"));
}

#[test]
fn test_duplicate_add_leaves_file_untouched() {
    let (mut store, _dir) = seeded_store();
    let before = std::fs::read_to_string(store.path()).unwrap();
    let err = store.add("stone", PropertyMap::new()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Catalog(blockmix_core::ReplaceError::DuplicateBlock(_))
    ));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    assert_eq!(store.catalog().len(), 3);
}

#[test]
fn test_remove_missing_block_is_a_no_op() {
    let (mut store, _dir) = seeded_store();
    assert!(!store.remove("granite").unwrap());
    assert_eq!(store.catalog().len(), 3);
}

#[test]
fn test_failed_write_keeps_memory_unchanged() {
    let dir = tempdir().unwrap();
    // the catalog path is a directory, so the rename fails
    let blocked = dir.path().join("blocks.json");
    std::fs::create_dir(&blocked).unwrap();
    std::fs::write(blocked.join("keep"), "x").unwrap();

    let mut store = CatalogStore::empty(&StorageConfig {
        catalog_path: blocked.clone(),
        pretty: true,
    });
    let err = store.add("stone", PropertyMap::new()).unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }), "got {err:?}");
    assert!(store.catalog().is_empty());
    assert!(!dir.path().join("blocks.json.tmp").exists());
}

#[test]
fn test_malformed_catalog_degrades_to_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blocks.json");
    std::fs::write(&path, "{ not json").unwrap();

    let (store, err) = CatalogStore::load_or_empty(&path);
    assert!(store.catalog().is_empty());
    assert!(matches!(err, Some(StorageError::MalformedCatalog { .. })));
}

#[test]
fn test_missing_catalog_reports_not_found() {
    let dir = tempdir().unwrap();
    let (store, err) = CatalogStore::load_or_empty(dir.path().join("nope.json"));
    assert!(store.catalog().is_empty());
    assert!(err.expect("missing file is reported").is_not_found());
}

#[test]
fn test_project_round_trip() {
    let (store, dir) = seeded_store();
    let catalog = store.catalog();

    let mut set = ReplacementSet::new(catalog, StructureType::Slab);
    set.set_base_block(catalog, "stone").unwrap();
    set.set_entry_count(catalog, 2).unwrap();
    set.set_entry_block(catalog, 0, "stone_brick_slab").unwrap();
    set.set_entry_block(catalog, 1, "cobblestone_slab").unwrap();
    set.set_entry_weight(0, 60).unwrap();
    set.set_entry_weight(1, 40).unwrap();
    set.set_entry_property(0, "half", "top").unwrap();
    set.clear_entry_property(1, "half").unwrap();

    let path = dir.path().join("project.json");
    let mut snapshot = ProjectSnapshot::capture(&set);
    snapshot.theme = Some(serde_json::json!("dark"));
    snapshot.save(&path).unwrap();
    assert!(snapshot.saved_at.is_some());

    let loaded = ProjectSnapshot::load(&path).unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.replacements[1].states["half"], "");

    let restored = loaded.restore(catalog, &ExactNameResolver).unwrap();
    assert_eq!(restored.synthesize().unwrap(), set.synthesize().unwrap());
    assert_eq!(restored.weights(), [60, 40]);
}

#[test]
fn test_legacy_project_with_string_count_and_readable_names() {
    let (store, dir) = seeded_store();
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"{
  "theme": "dark",
  "accent": "blue",
  "icons": true,
  "structure": "Slab",
  "base": "Stone",
  "count": "2",
  "replacements": [
    { "block": "Stone Brick Slab", "percent": 30, "states": { "half": "top" } },
    { "block": "Cobblestone Slab", "percent": 10, "states": { "half": "sideways" } }
  ]
}"#,
    )
    .unwrap();

    let snapshot = ProjectSnapshot::load(&path).unwrap();
    assert_eq!(snapshot.count, 2);
    assert_eq!(snapshot.icons, Some(serde_json::json!(true)));

    let set = snapshot
        .restore(store.catalog(), &ExactNameResolver)
        .unwrap();
    // "sideways" is not a legal half, so the default stays selected
    assert_eq!(
        set.synthesize().unwrap(),
        "//replace stone 75%stone_brick_slab[type=top],25%cobblestone_slab[type=bottom]"
    );
}

#[test]
fn test_malformed_project_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "structure": "Pillar" }"#).unwrap();
    assert!(matches!(
        ProjectSnapshot::load(&path),
        Err(StorageError::MalformedProject { .. })
    ));

    std::fs::write(&path, r#"{ "count": "many" }"#).unwrap();
    assert!(matches!(
        ProjectSnapshot::load(&path),
        Err(StorageError::MalformedProject { .. })
    ));
}

#[test]
fn test_out_of_range_count_fails_restore() {
    let (store, _dir) = seeded_store();
    let snapshot: ProjectSnapshot = serde_json::from_str(r#"{ "count": 12 }"#).unwrap();
    assert!(matches!(
        snapshot.restore(store.catalog(), &ExactNameResolver),
        Err(StorageError::Catalog(
            blockmix_core::ReplaceError::InvalidEntryCount(12)
        ))
    ));
}

#[test]
fn test_export_writes_trimmed_command() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("replace_command.txt");
    export_command(&path, "  //replace stone 100%andesite\n").unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "//replace stone 100%andesite"
    );
}

#[test]
fn test_config_defaults() {
    let config = StorageConfig::default();
    assert_eq!(config.catalog_path, std::path::PathBuf::from("blocks.json"));
    assert!(config.pretty);

    let partial: StorageConfig = serde_json::from_str(r#"{ "pretty": false }"#).unwrap();
    assert_eq!(partial.catalog_path, config.catalog_path);
    assert!(!partial.pretty);
}
