use foxy_jumpscare::settings::{resolve_against, AppContext, Settings, SETTINGS_FILE};
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let settings = Settings::load(dir.path().join(SETTINGS_FILE)).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.tick_interval(), Duration::from_millis(1000));
    assert_eq!(settings.roll_max, 10_000);
    assert_eq!((settings.green_min, settings.green_diff), (80, 30));
    assert_eq!(settings.hotkey.as_deref(), Some("Ctrl+Alt+Shift+J"));
    assert_eq!(settings.startup_script_name, "FoxyJumpscare.vbs");
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    std::fs::write(&path, r#"{ "roll_max": 50, "hotkey": null }"#).unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.roll_max, 50);
    assert_eq!(settings.hotkey, None);
    assert_eq!(settings.video_path, "assets/jump.mp4");
    assert_eq!(settings.open_timeout(), Duration::from_millis(5000));
}

#[test]
fn out_of_range_values_are_clamped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    std::fs::write(
        &path,
        r#"{ "roll_max": 0, "tick_interval_ms": 0, "volume": 3.5 }"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.roll_max, 1);
    assert_eq!(settings.tick_interval_ms, 1);
    assert_eq!(settings.volume, 1.0);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    std::fs::write(&path, "{ not json").unwrap();
    let err = Settings::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("invalid settings file"));
}

#[test]
fn context_resolves_paths_beside_the_executable() {
    let exe = Path::new("/opt/foxy/foxy_jumpscare").to_path_buf();
    let ctx = AppContext::new(exe, Settings::default(), false);
    assert_eq!(ctx.base_dir, Path::new("/opt/foxy"));
    assert_eq!(ctx.video_path, Path::new("/opt/foxy/assets/jump.mp4"));
    assert_eq!(ctx.log_path, Path::new("/opt/foxy/jumpscare_log.txt"));
}

#[test]
fn absolute_paths_are_kept() {
    let base = Path::new("/opt/foxy");
    let absolute = std::env::temp_dir().join("clip.mp4");
    assert_eq!(resolve_against(base, &absolute.to_string_lossy()), absolute);
    assert_eq!(resolve_against(base, "clip.mp4"), base.join("clip.mp4"));
}
