#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

use mowlink_api::CONFIRM_INTERVAL;

use mowlink_config::{
    Config, ConfigError, Profile, load_config_from, profile_to_settings, render_redacted,
    save_config_to, select_profile,
};

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.defaults.poll_interval, 120);
    assert_eq!(cfg.defaults.burst_delays, vec![2, 10, 20, 40, 60]);
}

#[test]
fn profile_overrides_flow_into_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
default_profile = "garden"

[defaults]
unavailable_fetches = 5
burst_delays = [1, 5]

[profiles.garden]
robot_id = "R-1024"
user_id = "42"
user_token = "s3cret"
base_url = "http://localhost:8080"
poll_interval = 60
"#,
    );

    let cfg = load_config_from(&path).unwrap();
    let (name, profile) = select_profile(&cfg, None).unwrap();
    let settings = profile_to_settings(&cfg.defaults, profile, &name).unwrap();

    assert_eq!(name, "garden");
    assert_eq!(settings.device_id.as_str(), "R-1024");
    assert_eq!(settings.base_url.as_str(), "http://localhost:8080/");
    assert_eq!(settings.credentials.user_token.expose_secret(), "s3cret");
    assert_eq!(settings.coordinator.poll_interval, Duration::from_secs(60));
    assert_eq!(settings.coordinator.unavailable_fetches, 5);
    assert_eq!(
        settings.coordinator.burst_delays,
        vec![Duration::from_secs(1), Duration::from_secs(5)]
    );
    // Untouched knobs keep their defaults.
    assert_eq!(settings.coordinator.command_timeout, Duration::from_secs(40));
}

#[test]
fn unknown_profile_is_reported() {
    let cfg = Config::default();

    let err = select_profile(&cfg, Some("lawn")).unwrap_err();

    assert!(matches!(err, ConfigError::UnknownProfile { ref name } if name == "lawn"));
}

#[test]
fn token_env_falls_back_to_plaintext() {
    let profile = Profile {
        robot_id: "R1".into(),
        user_id: "7".into(),
        user_token: Some("plain".into()),
        user_token_env: Some("MOWLINK_TEST_TOKEN_THAT_IS_NEVER_SET".into()),
        ..Profile::default()
    };

    let settings = profile_to_settings(&Config::default().defaults, &profile, "p").unwrap();

    assert_eq!(settings.credentials.user_token.expose_secret(), "plain");
}

#[test]
fn missing_token_is_an_error() {
    let profile = Profile {
        robot_id: "R1".into(),
        user_id: "7".into(),
        ..Profile::default()
    };

    let err = profile_to_settings(&Config::default().defaults, &profile, "p").unwrap_err();

    assert!(matches!(err, ConfigError::NoCredentials { .. }));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let profile = Profile {
        robot_id: "R1".into(),
        user_id: "7".into(),
        user_token: Some("t".into()),
        poll_interval: Some(0),
        ..Profile::default()
    };

    let err = profile_to_settings(&Config::default().defaults, &profile, "p").unwrap_err();

    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "poll_interval"));
}

#[test]
fn saved_config_loads_back_and_redacts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut cfg = Config::default();
    cfg.profiles.insert(
        "default".into(),
        Profile {
            robot_id: "R9".into(),
            user_id: "1".into(),
            user_token: Some("hunter2".into()),
            ..Profile::default()
        },
    );

    save_config_to(&cfg, &path).unwrap();
    let loaded = load_config_from(&path).unwrap();
    let rendered = render_redacted(&loaded).unwrap();

    assert_eq!(loaded, cfg);
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn read_back_budget_follows_command_timeout() {
    let mut profile = Profile {
        robot_id: "R1".into(),
        user_id: "7".into(),
        user_token: Some("t".into()),
        ..Profile::default()
    };
    let defaults = Config::default().defaults;

    let settings = profile_to_settings(&defaults, &profile, "p").unwrap();
    assert_eq!(settings.confirm_attempts(), 15);

    profile.command_timeout = Some(20);
    let settings = profile_to_settings(&defaults, &profile, "p").unwrap();
    assert_eq!(settings.confirm_attempts(), 7);
    assert!(CONFIRM_INTERVAL * settings.confirm_attempts() < settings.coordinator.command_timeout);
}
