use super::*;
use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_with(&dir.path().join("missing.toml"), env_from(&[]));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.session_config().time_limit, Duration::from_secs(10));
    assert_eq!(settings.session_config().tick_steps, 100);
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("quiz.toml");
    fs::write(
        &path,
        "start_url = \"http://localhost:3000/question/1\"\ntime_limit_ms = 20000\ndatabase_url = \"sqlite::memory:\"\n",
    )
    .expect("write config");

    let settings = load_settings_with(&path, env_from(&[]));
    assert_eq!(settings.start_url, "http://localhost:3000/question/1");
    assert_eq!(settings.time_limit_ms, 20_000);
    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.tick_steps, 100);
}

#[test]
fn environment_overrides_file_and_prefixed_names_win() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("quiz.toml");
    fs::write(&path, "time_limit_ms = 20000\n").expect("write config");

    let settings = load_settings_with(
        &path,
        env_from(&[
            ("QUIZ_TIME_LIMIT_MS", "15000"),
            ("APP__TIME_LIMIT_MS", "5000"),
            ("QUIZ_START_URL", "http://env.test/q/1"),
            ("APP__TICK_STEPS", "not-a-number"),
            ("APP__LOG_LEVEL", "debug"),
        ]),
    );
    assert_eq!(settings.time_limit_ms, 5_000);
    assert_eq!(settings.start_url, "http://env.test/q/1");
    assert_eq!(settings.tick_steps, 100);
    assert_eq!(settings.log_level, "debug");
}

#[test]
fn malformed_file_is_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("quiz.toml");
    fs::write(&path, "time_limit_ms = \"soon\"\n[[[").expect("write config");

    assert_eq!(load_settings_with(&path, env_from(&[])), Settings::default());
}

#[test]
fn zero_limits_are_clamped_in_session_config() {
    let settings = Settings {
        time_limit_ms: 0,
        tick_steps: 0,
        ..Settings::default()
    };
    let config = settings.session_config();
    assert_eq!(config.time_limit, Duration::from_millis(1));
    assert_eq!(config.tick_steps, 1);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/quiz.db"),
        "sqlite://./data/quiz.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(normalize_database_url("   "), Settings::default().database_url);
}

#[test]
fn creates_parent_dir_for_sqlite_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("quiz.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    assert!(prepared.starts_with("sqlite://"));
    assert!(dir.path().join("nested").exists());
}
