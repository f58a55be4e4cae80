//! Tests for configuration file loading.

use super::*;
use serial_test::serial;
use std::env;
use std::fs;

/// RAII guard to ensure environment variable cleanup even under test parallelism.
struct EnvGuard(&'static str);

impl EnvGuard {
    fn new(name: &'static str) -> Self {
        env::remove_var(name);
        EnvGuard(name)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        env::remove_var(self.0);
    }
}

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = env::temp_dir().join(name);
    fs::write(&path, contents).expect("Failed to write test config");
    path
}

#[test]
fn default_config_path_contains_readsync_config_toml() {
    let path = default_config_path().expect("Should have default path");
    let path_str = path.to_string_lossy();
    assert!(
        path_str.contains("readsync") && path_str.ends_with("config.toml"),
        "Path should contain 'readsync' and end with 'config.toml', got: {}",
        path_str
    );
}

#[test]
fn default_log_path_ends_with_readsync_log() {
    let path = default_log_path();
    assert!(
        path.to_string_lossy().ends_with("readsync.log"),
        "got: {:?}",
        path
    );
}

#[test]
fn load_config_file_returns_ok_none_for_missing_file() {
    let result = load_config_file("/nonexistent/path/to/config.toml");
    assert_eq!(result, Ok(None));
}

#[test]
fn load_config_file_parses_valid_toml() {
    let config_path = write_temp(
        "readsync_test_config.toml",
        r#"
debounce_ms = 100
backoff_base_ms = 500
backoff_max_ms = 8000
backoff_jitter = 0.0
activity_interval_secs = 30
near_bottom_threshold = 48.5
log_file_path = "/tmp/readsync-test.log"
"#,
    );

    let config = load_config_file(&config_path)
        .expect("Should successfully parse valid TOML")
        .expect("Should return Some(ConfigFile) for existing file");

    assert_eq!(config.debounce_ms, Some(100));
    assert_eq!(config.backoff_base_ms, Some(500));
    assert_eq!(config.backoff_max_ms, Some(8000));
    assert_eq!(config.backoff_jitter, Some(0.0));
    assert_eq!(config.activity_interval_secs, Some(30));
    assert_eq!(config.near_bottom_threshold, Some(48.5));
    assert_eq!(
        config.log_file_path,
        Some(PathBuf::from("/tmp/readsync-test.log"))
    );

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_returns_error_for_invalid_toml() {
    let config_path = write_temp("readsync_test_invalid.toml", "this is not valid TOML ][}{");

    match load_config_file(&config_path) {
        Err(ConfigError::ParseError { path, .. }) => assert_eq!(path, config_path),
        other => panic!("Expected ParseError, got {:?}", other),
    }

    fs::remove_file(config_path).ok();
}

#[test]
fn config_file_rejects_unknown_fields() {
    let result: Result<ConfigFile, _> = toml::from_str("theme = \"monokai\"");
    assert!(result.is_err(), "Unknown keys should be rejected");
}

#[test]
fn merge_config_uses_defaults_when_none() {
    assert_eq!(merge_config(None), ResolvedConfig::default());
}

#[test]
fn merge_config_uses_defaults_for_none_fields() {
    let file = ConfigFile {
        debounce_ms: Some(75),
        ..ConfigFile::default()
    };

    let resolved = merge_config(Some(file));
    let defaults = ResolvedConfig::default();

    assert_eq!(resolved.debounce_ms, 75);
    assert_eq!(resolved.backoff_base_ms, defaults.backoff_base_ms);
    assert_eq!(resolved.backoff_max_ms, defaults.backoff_max_ms);
    assert_eq!(resolved.activity_interval_secs, defaults.activity_interval_secs);
    assert_eq!(resolved.log_file_path, defaults.log_file_path);
}

#[test]
fn resolved_config_default_has_expected_values() {
    let config = ResolvedConfig::default();
    assert_eq!(config.debounce_ms, 250);
    assert_eq!(config.backoff_base_ms, 1_000);
    assert_eq!(config.backoff_max_ms, 60_000);
    assert_eq!(config.backoff_jitter, 0.2);
    assert_eq!(config.activity_interval_secs, 15);
    assert_eq!(config.near_bottom_threshold, 24.0);
    assert!(config.validate().is_ok());
}

#[test]
fn validate_rejects_base_above_max() {
    let config = ResolvedConfig {
        backoff_base_ms: 10_000,
        backoff_max_ms: 5_000,
        ..ResolvedConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn validate_rejects_zero_base() {
    let config = ResolvedConfig {
        backoff_base_ms: 0,
        ..ResolvedConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn validate_rejects_jitter_out_of_range() {
    for jitter in [-0.1, 1.5, f64::NAN] {
        let config = ResolvedConfig {
            backoff_jitter: jitter,
            ..ResolvedConfig::default()
        };
        assert!(config.validate().is_err(), "jitter {jitter} accepted");
    }
}

#[test]
fn view_settings_convert_units() {
    let config = ResolvedConfig {
        debounce_ms: 40,
        backoff_base_ms: 200,
        backoff_max_ms: 3_000,
        backoff_jitter: 0.5,
        activity_interval_secs: 7,
        ..ResolvedConfig::default()
    };

    let settings = config.view_settings();
    assert_eq!(settings.sync.debounce, Duration::from_millis(40));
    assert_eq!(settings.sync.backoff.base, Duration::from_millis(200));
    assert_eq!(settings.sync.backoff.max, Duration::from_secs(3));
    assert_eq!(settings.sync.backoff.jitter, 0.5);
    assert_eq!(settings.activity_interval, Duration::from_secs(7));
    assert_eq!(settings.near_bottom_threshold, 24.0);
}

#[test]
#[serial(readsync_env)]
fn apply_env_overrides_reads_both_variables() {
    let _debounce = EnvGuard::new(DEBOUNCE_ENV);
    let _interval = EnvGuard::new(ACTIVITY_INTERVAL_ENV);
    env::set_var(DEBOUNCE_ENV, "90");
    env::set_var(ACTIVITY_INTERVAL_ENV, " 3 ");

    let result = apply_env_overrides(ResolvedConfig::default()).expect("valid env");

    assert_eq!(result.debounce_ms, 90);
    assert_eq!(result.activity_interval_secs, 3);
    assert_eq!(result.backoff_base_ms, ResolvedConfig::default().backoff_base_ms);
}

#[test]
#[serial(readsync_env)]
fn apply_env_overrides_no_change_when_env_var_not_set() {
    let _debounce = EnvGuard::new(DEBOUNCE_ENV);
    let _interval = EnvGuard::new(ACTIVITY_INTERVAL_ENV);

    let base = ResolvedConfig::default();
    assert_eq!(apply_env_overrides(base.clone()), Ok(base));
}

#[test]
#[serial(readsync_env)]
fn apply_env_overrides_rejects_garbage() {
    let _debounce = EnvGuard::new(DEBOUNCE_ENV);
    env::set_var(DEBOUNCE_ENV, "soon");

    assert_eq!(
        apply_env_overrides(ResolvedConfig::default()),
        Err(ConfigError::InvalidEnvValue {
            name: DEBOUNCE_ENV,
            value: "soon".to_string(),
        })
    );
}

#[test]
#[serial(readsync_config)]
fn load_config_with_precedence_prefers_explicit_path() {
    let _guard = EnvGuard::new(CONFIG_ENV);
    let explicit_path = write_temp("readsync_explicit.toml", "debounce_ms = 11");
    let env_path = write_temp("readsync_env.toml", "debounce_ms = 22");
    env::set_var(CONFIG_ENV, env_path.to_str().unwrap());

    let config = load_config_with_precedence(Some(explicit_path.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(config.debounce_ms, Some(11), "explicit path wins over env");

    fs::remove_file(explicit_path).ok();
    fs::remove_file(env_path).ok();
}

#[test]
#[serial(readsync_config)]
fn load_config_with_precedence_uses_env_var_when_no_explicit_path() {
    let _guard = EnvGuard::new(CONFIG_ENV);
    let env_path = write_temp("readsync_env_only.toml", "debounce_ms = 33");
    env::set_var(CONFIG_ENV, env_path.to_str().unwrap());

    let config = load_config_with_precedence(None).unwrap().unwrap();
    assert_eq!(config.debounce_ms, Some(33));

    fs::remove_file(env_path).ok();
}

#[test]
fn apply_cli_overrides_only_touches_given_flags() {
    let base = ResolvedConfig::default();
    assert_eq!(apply_cli_overrides(base.clone(), None, None), base);

    let result = apply_cli_overrides(base, Some(5), Some(PathBuf::from("/tmp/x.log")));
    assert_eq!(result.debounce_ms, 5);
    assert_eq!(result.log_file_path, PathBuf::from("/tmp/x.log"));
}

#[test]
#[serial(readsync_env)]
fn precedence_chain_full_defaults_to_cli() {
    let _debounce = EnvGuard::new(DEBOUNCE_ENV);
    let _interval = EnvGuard::new(ACTIVITY_INTERVAL_ENV);
    let path = write_temp(
        "readsync_chain.toml",
        "debounce_ms = 100\nactivity_interval_secs = 20\nbackoff_max_ms = 9000",
    );

    let file = load_config_file(&path).unwrap();
    let merged = merge_config(file);
    assert_eq!(merged.debounce_ms, 100);

    env::set_var(DEBOUNCE_ENV, "200");
    env::set_var(ACTIVITY_INTERVAL_ENV, "40");
    let with_env = apply_env_overrides(merged).unwrap();
    assert_eq!(with_env.debounce_ms, 200);

    let resolved = apply_cli_overrides(with_env, Some(300), None);
    assert_eq!(resolved.debounce_ms, 300, "CLI wins");
    assert_eq!(resolved.activity_interval_secs, 40, "env beats file");
    assert_eq!(resolved.backoff_max_ms, 9_000, "file beats defaults");

    fs::remove_file(path).ok();
}
