use super::*;
use tempfile::tempdir;

#[test]
fn missing_settings_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn partial_settings_fill_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "ignored_names": ["target"] }"#).unwrap();

    let settings = load_settings_from(&path).unwrap();
    assert_eq!(settings.ignored_names, vec!["target".to_string()]);
    assert_eq!(settings.log_filter, Settings::default().log_filter);
    assert!(settings.is_ignored("target"));
    assert!(settings.is_ignored(".git"));
}

#[test]
fn malformed_settings_are_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "[1, 2").unwrap();
    assert!(matches!(
        load_settings_from(&path),
        Err(SettingsError::Parse { .. })
    ));
}

#[test]
fn settings_path_lives_under_app_dir() {
    let path = get_settings_path().unwrap();
    assert!(path.ends_with(format!("{SETTINGS_DIR}/{SETTINGS_FILE}")));
}
