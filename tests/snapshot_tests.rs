//! Snapshot file loading tests
//!
//! Snapshots are written to a temporary directory and loaded the way the
//! binary loads them, then queried through the resulting engine.

use std::fs;
use tempfile::tempdir;
use uam_access::access_control::{AccessMode, ActorContext, ObjectType};
use uam_access::config::{AccessOptions, AppConfig};
use uam_access::{AppError, ConfigError, Snapshot};

const JSON_SNAPSHOT: &str = r#"{
    "groups": [
        {
            "id": 1,
            "name": "Intranet",
            "ip_ranges": ["10.0.0.1-10.0.0.255"],
            "objects": { "category": ["7"] }
        },
        {
            "id": 2,
            "name": "Newsletter",
            "read_access": "all",
            "objects": { "page": ["about"], "user": ["42"] }
        }
    ],
    "tree_map": {
        "parents": {
            "post": { "12": { "7": "category" }, "13": { "12": "post", "7": "category" } }
        },
        "children": {
            "category": { "7": { "12": "post", "13": "post" } },
            "post": { "12": { "13": "post" } }
        }
    },
    "authors": { "13": "5" }
}"#;

const TOML_SNAPSHOT: &str = r#"
[[groups]]
id = 1
name = "Intranet"
ip_ranges = ["10.0.0.1-10.0.0.255"]
objects = { category = ["7"] }

[tree_map.parents.post.12]
7 = "category"

[tree_map.children.category.7]
12 = "post"
"#;

#[test]
fn test_load_json_snapshot_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    fs::write(&path, JSON_SNAPSHOT).unwrap();

    let engine = Snapshot::load(&path)
        .unwrap()
        .into_engine(AccessOptions::default());

    let visitor = ActorContext::user("9", Some(0));
    let office = visitor.clone().with_remote_addr("10.0.0.44");
    let author = ActorContext::user("5", Some(0));

    // Posts under category 7 inherit the intranet restriction
    for post in ["12", "13"] {
        assert!(
            !engine
                .decide(ObjectType::Post, post, &visitor, AccessMode::Read)
                .unwrap()
        );
        assert!(
            engine
                .decide(ObjectType::Post, post, &office, AccessMode::Read)
                .unwrap()
        );
    }

    // Only post 13 was written by user 5
    assert!(
        engine
            .decide(ObjectType::Post, "13", &author, AccessMode::Write)
            .unwrap()
    );
    assert!(
        !engine
            .decide(ObjectType::Post, "12", &author, AccessMode::Write)
            .unwrap()
    );

    // The newsletter page is readable by anyone, writable by members only
    assert!(
        engine
            .decide(ObjectType::Page, "about", &ActorContext::anonymous(), AccessMode::Read)
            .unwrap()
    );
    assert!(
        !engine
            .decide(ObjectType::Page, "about", &visitor, AccessMode::Write)
            .unwrap()
    );
    assert!(
        engine
            .decide(
                ObjectType::Page,
                "about",
                &ActorContext::user("42", Some(0)),
                AccessMode::Write
            )
            .unwrap()
    );
}

#[test]
fn test_load_toml_snapshot_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.toml");
    fs::write(&path, TOML_SNAPSHOT).unwrap();

    let snapshot = Snapshot::load(&path).unwrap();
    assert_eq!(snapshot.groups.len(), 1);

    let engine = snapshot.into_engine(AccessOptions::default());
    let groups = engine.groups_for_object(ObjectType::Post, "12").unwrap();
    assert!(groups[&1].assignment.has_ancestor(ObjectType::Category, "7"));

    let objects = engine
        .objects_for_group(1, ObjectType::Category, true)
        .unwrap()
        .unwrap();
    assert_eq!(objects.len(), 1);
}

#[test]
fn test_json_content_in_toml_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.toml");
    fs::write(&path, JSON_SNAPSHOT).unwrap();

    assert!(matches!(Snapshot::load(&path), Err(ConfigError::Load(_))));
}

#[test]
fn test_missing_snapshot_file() {
    let dir = tempdir().unwrap();
    let result = Snapshot::load(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_unknown_object_type_in_tree_map() {
    let result = Snapshot::from_json_str(
        r#"{ "tree_map": { "parents": { "widget": { "1": { "2": "post" } } } } }"#,
    );
    assert!(matches!(result, Err(ConfigError::MalformedTreeMap { .. })));
}

#[test]
fn test_load_configured_without_path() {
    let result = Snapshot::load_configured(&AppConfig::default(), None);
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::Missing { field })) if field == "snapshot.path"
    ));
}

#[test]
fn test_load_configured_override_wins() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.toml");
    fs::write(&path, TOML_SNAPSHOT).unwrap();

    let mut config = AppConfig::default();
    config.snapshot.path = Some(dir.path().join("absent.json").display().to_string());

    let snapshot = Snapshot::load_configured(&config, path.to_str()).unwrap();
    assert_eq!(snapshot.groups.len(), 1);

    assert!(matches!(
        Snapshot::load_configured(&config, None),
        Err(AppError::Config(ConfigError::Io(_)))
    ));
}
