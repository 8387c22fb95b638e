//! Configuration loading tests

use uam_access::config::{LogFormat, MAX_USER_LEVEL, load_config_from_str};

const MINIMAL_CONFIG: &str = r#"
[snapshot]
path = "snapshot.json"
"#;

const FULL_CONFIG: &str = r#"
[access]
full_access_level = 8
authors_has_access_to_own = false

[snapshot]
path = "/var/lib/uam/snapshot.toml"

[logging]
level = "debug"
format = "json"
"#;

#[test]
fn test_minimal_config() {
    let config = load_config_from_str(MINIMAL_CONFIG).unwrap();

    assert_eq!(config.snapshot.path.as_deref(), Some("snapshot.json"));
    assert_eq!(config.access.full_access_level, MAX_USER_LEVEL);
    assert!(config.access.authors_has_access_to_own);
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    // Access
    assert_eq!(config.access.full_access_level, 8);
    assert!(!config.access.authors_has_access_to_own);

    // Snapshot
    assert_eq!(
        config.snapshot.path.as_deref(),
        Some("/var/lib/uam/snapshot.toml")
    );

    // Logging
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_config_defaults() {
    let config = load_config_from_str("").unwrap();

    assert_eq!(config.access.full_access_level, 10);
    assert!(config.access.authors_has_access_to_own);
    assert!(config.snapshot.path.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_invalid_full_access_level() {
    let config_str = r#"
[access]
full_access_level = 42
"#;

    let result = load_config_from_str(config_str);
    assert!(result.is_err());
}

#[test]
fn test_invalid_log_format() {
    let config_str = r#"
[logging]
format = "xml"
"#;

    let result = load_config_from_str(config_str);
    assert!(result.is_err());
}

#[test]
#[serial_test::serial]
fn test_missing_explicit_config_file() {
    use uam_access::config::load_config;

    let result = load_config(Some("/nonexistent/uam-access.toml"));
    assert!(result.is_err());
}

#[test]
#[serial_test::serial]
fn test_env_var_overrides_file() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;
    use uam_access::config::load_config;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    let config_content = r#"
[access]
full_access_level = 8

[snapshot]
path = "from-file.json"
"#;
    fs::write(&config_path, config_content).unwrap();

    unsafe {
        env::set_var("UAM_ACCESS__ACCESS__FULL_ACCESS_LEVEL", "3");
        env::set_var("UAM_ACCESS__SNAPSHOT__PATH", "from-env.json");
    }

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();

    // Environment wins over the file
    assert_eq!(config.access.full_access_level, 3);
    assert_eq!(config.snapshot.path.as_deref(), Some("from-env.json"));

    // Cleanup
    unsafe {
        env::remove_var("UAM_ACCESS__ACCESS__FULL_ACCESS_LEVEL");
        env::remove_var("UAM_ACCESS__SNAPSHOT__PATH");
    }
}

#[test]
#[serial_test::serial]
fn test_env_var_out_of_range_level_is_rejected() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;
    use uam_access::config::load_config;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    fs::write(&config_path, "").unwrap();

    unsafe {
        env::set_var("UAM_ACCESS__ACCESS__FULL_ACCESS_LEVEL", "11");
    }

    let result = load_config(Some(config_path.to_str().unwrap()));
    assert!(result.is_err());

    unsafe {
        env::remove_var("UAM_ACCESS__ACCESS__FULL_ACCESS_LEVEL");
    }
}

#[test]
#[serial_test::serial]
fn test_snapshot_path_tilde_is_expanded() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;
    use uam_access::config::load_config;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    let config_content = r#"
[snapshot]
path = "~/uam/snapshot.json"
"#;
    fs::write(&config_path, config_content).unwrap();

    let original_home = env::var_os("HOME");
    unsafe {
        env::set_var("HOME", dir.path());
    }

    let result = load_config(Some(config_path.to_str().unwrap()));

    // Cleanup
    unsafe {
        match original_home {
            Some(home) => env::set_var("HOME", home),
            None => env::remove_var("HOME"),
        }
    }

    let config = result.unwrap();
    let expected = dir.path().join("uam/snapshot.json");
    assert_eq!(
        config.snapshot.path.as_deref(),
        Some(expected.to_str().unwrap())
    );
}
