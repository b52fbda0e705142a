use std::fs;

use tasksync::config::Config;
use tempfile::TempDir;

#[test]
fn test_defaults_are_valid() {
    let config = Config::default();
    config.validate().unwrap();

    assert_eq!(config.remote.backend, "fake");
    assert_eq!(config.calendar.provider, "fake");
    assert_eq!(config.calendar.import_window_days, 30);
    assert_eq!(config.calendar.imported_list_name, "Imported");
    assert!(!config.calendar.export_after_sync);
    assert!(!config.logging.enabled);
    assert_eq!(config.storage.database_path(), None);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tasksync.toml");
    fs::write(
        &path,
        r#"
[calendar]
provider = "memory"
import_window_days = 14

[logging]
level = "DEBUG"
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.calendar.provider, "memory");
    assert_eq!(config.calendar.import_window_days, 14);
    assert_eq!(config.calendar.imported_list_name, "Imported");
    assert_eq!(config.remote.backend, "fake");
    assert_eq!(config.logging.level_filter(), log::LevelFilter::Debug);
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut config = Config::default();
    config.calendar.import_window_days = 0;
    assert!(config.validate().is_err());
    config.calendar.import_window_days = 366;
    assert!(config.validate().is_err());
    config.calendar.import_window_days = 365;
    config.validate().unwrap();

    let mut config = Config::default();
    config.remote.backend = "carrier-pigeon".to_string();
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("carrier-pigeon"));

    let mut config = Config::default();
    config.calendar.provider = "outlook".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.calendar.imported_list_name = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_rest_backend_needs_base_url() {
    let mut config = Config::default();
    config.remote.backend = "rest".to_string();
    assert!(config.validate().is_err());

    config.remote.base_url = Some("ftp://example.com".to_string());
    assert!(config.validate().is_err());

    config.remote.base_url = Some("https://example.supabase.co".to_string());
    config.validate().unwrap();
}

#[test]
fn test_invalid_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "[calendar\nprovider = ").unwrap();

    let err = format!("{:#}", Config::load_from_file(&path).unwrap_err());
    assert!(err.contains("Failed to parse config file"));
    assert!(err.contains("broken.toml"));

    let missing = temp_dir.path().join("missing.toml");
    assert!(Config::load_from_file(&missing).is_err());
}

#[test]
fn test_generated_config_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    Config::generate_default_config(&path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# tasksync Configuration File"));
    assert!(content.contains("[calendar]"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.calendar.import_window_days, 30);
    assert_eq!(loaded.remote.api_key_env, "TASKSYNC_API_KEY");
}
