use castlytics::config::{load_env_files, AppConfig, ConfigError};
use castlytics::neynar::CastSource;
use castlytics::retry::Backoff;
use std::collections::HashMap;
use std::time::Duration;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_the_dashboard() {
    let config = AppConfig::default();

    assert_eq!(config.ranking.limit, 5);
    assert_eq!(config.neynar.fetch_limit, 50);
    assert_eq!(config.neynar.api_base, "https://api.neynar.com/v2");
    assert_eq!(config.neynar.source, CastSource::UserCasts);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.backoff, Backoff::Fixed);
    assert_eq!(config.app.url, "https://cast-analytics.vercel.app");
    assert!(config.validate().is_ok());
}

#[test]
fn missing_api_key_is_a_configuration_error() {
    let mut config = AppConfig::default();
    assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));

    config.neynar.api_key = Some("   ".to_string());
    assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));

    config.neynar.api_key = Some(" key-123 ".to_string());
    assert_eq!(config.require_api_key().unwrap(), "key-123");
}

#[test]
fn partial_toml_keeps_defaults_for_the_rest() {
    let config = AppConfig::from_toml_str(
        r#"
        [neynar]
        fetch_limit = 100
        source = "feed"

        [retry]
        backoff = "exponential"
        delay_ms = 200
        "#,
    )
    .unwrap();

    assert_eq!(config.neynar.fetch_limit, 100);
    assert_eq!(config.neynar.source, CastSource::Feed);
    assert_eq!(config.neynar.timeout_ms, 10_000);
    assert_eq!(config.ranking.limit, 5);
    let policy = config.retry.to_policy();
    assert_eq!(policy.max_attempts(), 3);
    assert_eq!(policy.delay_after(2), Duration::from_millis(400));
}

#[test]
fn environment_overrides_apply() {
    let mut config = AppConfig::default();
    config.apply_overrides(lookup(&[
        ("NEYNAR_API_KEY", "secret"),
        ("NEYNAR_API_BASE", "http://localhost:9999/v2"),
        ("NEYNAR_CAST_SOURCE", "feed"),
        ("CASTLYTICS_TOP_LIMIT", "10"),
        ("CASTLYTICS_RETRY_ATTEMPTS", "5"),
        ("CASTLYTICS_RETRY_BACKOFF", "exponential"),
        ("NEXT_PUBLIC_URL", "https://fallback.example"),
        ("CASTLYTICS_PORT", "8080"),
    ]));

    assert_eq!(config.neynar.api_key.as_deref(), Some("secret"));
    assert_eq!(config.neynar.api_base, "http://localhost:9999/v2");
    assert_eq!(config.neynar.source, CastSource::Feed);
    assert_eq!(config.ranking.limit, 10);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.backoff, Backoff::Exponential);
    assert_eq!(config.app.url, "https://fallback.example");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn app_url_wins_over_next_public_url() {
    let mut config = AppConfig::default();
    config.apply_overrides(lookup(&[
        ("APP_URL", "https://primary.example"),
        ("NEXT_PUBLIC_URL", "https://fallback.example"),
    ]));

    assert_eq!(config.app.url, "https://primary.example");
}

#[test]
fn next_public_app_url_comes_before_next_public_url() {
    let mut config = AppConfig::default();
    config.apply_overrides(lookup(&[
        ("NEXT_PUBLIC_APP_URL", "https://share.example"),
        ("NEXT_PUBLIC_URL", "https://fallback.example"),
    ]));

    assert_eq!(config.app.url, "https://share.example");
}

#[test]
fn unparsable_and_blank_overrides_are_ignored() {
    let mut config = AppConfig::default();
    config.apply_overrides(lookup(&[
        ("NEYNAR_API_KEY", "  "),
        ("CASTLYTICS_TOP_LIMIT", "many"),
        ("NEYNAR_CAST_SOURCE", "firehose"),
        ("CASTLYTICS_PORT", "99999"),
    ]));

    assert_eq!(config.neynar.api_key, None);
    assert_eq!(config.ranking.limit, 5);
    assert_eq!(config.neynar.source, CastSource::UserCasts);
    assert_eq!(config.server.port, 3000);
}

#[test]
fn validation_rejects_out_of_range_values() {
    let mut config = AppConfig::default();
    config.ranking.limit = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { ref name, .. }) if name == "ranking.limit"
    ));

    let mut config = AppConfig::default();
    config.neynar.fetch_limit = 151;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.retry.max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn written_config_omits_the_api_key_and_reloads() {
    let dir = std::env::temp_dir().join(format!("castlytics-config-{}", std::process::id()));
    let path = dir.join("castlytics.toml");

    let mut config = AppConfig::default();
    config.neynar.api_key = Some("do-not-persist".to_string());
    config.ranking.limit = 7;
    config.write(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(!written.contains("do-not-persist"));

    let reloaded = AppConfig::from_file(&path).unwrap();
    assert_eq!(reloaded.ranking.limit, 7);
    assert_eq!(reloaded.neynar.api_key, None);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unreadable_toml_reports_the_path() {
    let dir = std::env::temp_dir().join(format!("castlytics-bad-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.toml");
    std::fs::write(&path, "[ranking\nlimit = ").unwrap();

    let err = AppConfig::from_file(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn env_files_load_from_the_given_directory_with_local_first() {
    let dir = std::env::temp_dir().join(format!("castlytics-env-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(".env.local"),
        "CASTLYTICS_ENV_FILE_SHARED=local\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(".env"),
        "CASTLYTICS_ENV_FILE_SHARED=base\nCASTLYTICS_ENV_FILE_BASE_ONLY=base\n",
    )
    .unwrap();

    let loaded = load_env_files(&dir);

    assert_eq!(loaded, vec![dir.join(".env.local"), dir.join(".env")]);
    assert_eq!(std::env::var("CASTLYTICS_ENV_FILE_SHARED").unwrap(), "local");
    assert_eq!(std::env::var("CASTLYTICS_ENV_FILE_BASE_ONLY").unwrap(), "base");
    assert!(load_env_files(&dir.join("missing")).is_empty());
    std::fs::remove_dir_all(&dir).unwrap();
}
