//! Unit tests for configuration loading, precedence, and validation.

use std::ffi::OsString;

use ortho_config::{MergeComposer, OrthoConfig};
use rstest::rstest;
use serde_json::{Value, json};

use super::{DEFAULT_LISTEN_ADDRESS, DEFAULT_MAX_CONNECTIONS, ReviewRotaConfig};
use crate::error::AppError;

fn build_config_from_layers(layers: Vec<(&str, Value)>) -> ReviewRotaConfig {
    let mut composer = MergeComposer::new();

    for (layer_type, value) in layers {
        match layer_type {
            "defaults" => composer.push_defaults(value),
            "file" => composer.push_file(value, None),
            "environment" => composer.push_environment(value),
            "cli" => composer.push_cli(value),
            _ => panic!("unknown layer type: {layer_type}"),
        }
    }

    ReviewRotaConfig::merge_from_layers(composer.layers()).expect("merge should succeed")
}

/// Loads configuration from `cli_args` with an isolated environment.
fn load_with(env: &[(&'static str, Option<&str>)], cli_args: &[&str]) -> ReviewRotaConfig {
    let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
    let home = temp_dir.path().to_string_lossy().into_owned();

    let mut vars: Vec<(&str, Option<&str>)> = vec![
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", Some(home.as_str())),
        ("REVIEWROTA_DATABASE_URL", None),
        ("REVIEWROTA_LISTEN_ADDRESS", None),
        ("REVIEWROTA_MAX_CONNECTIONS", None),
    ];
    for (name, value) in env {
        vars.retain(|(existing, _)| existing != name);
        vars.push((name, *value));
    }
    let _guard = env_lock::lock_env(vars);

    let mut args = vec![OsString::from("reviewrota")];
    args.extend(cli_args.iter().map(OsString::from));

    ReviewRotaConfig::load_from_iter(args).expect("config should load")
}

#[rstest]
fn defaults_leave_database_unset() {
    let config = ReviewRotaConfig::default();

    assert!(config.database_url.is_none());
    assert!(!config.migrate_db);
    assert!(!config.skip_migrations);
    assert_eq!(config.listen_address, DEFAULT_LISTEN_ADDRESS);
    assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
}

#[rstest]
#[case::file_overrides_defaults(
    vec![
        ("defaults", json!({"listen_address": "127.0.0.1:1"})),
        ("file", json!({"listen_address": "127.0.0.1:2"}))
    ],
    "127.0.0.1:2"
)]
#[case::environment_overrides_file(
    vec![
        ("file", json!({"listen_address": "127.0.0.1:2"})),
        ("environment", json!({"listen_address": "127.0.0.1:3"}))
    ],
    "127.0.0.1:3"
)]
#[case::cli_overrides_environment(
    vec![
        ("environment", json!({"listen_address": "127.0.0.1:3"})),
        ("cli", json!({"listen_address": "127.0.0.1:4"}))
    ],
    "127.0.0.1:4"
)]
fn listen_address_follows_layer_precedence(
    #[case] layers: Vec<(&str, Value)>,
    #[case] expected: &str,
) {
    let config = build_config_from_layers(layers);

    assert_eq!(config.listen_address, expected);
}

#[rstest]
fn database_url_takes_highest_layer() {
    let config = build_config_from_layers(vec![
        ("file", json!({"database_url": "file.sqlite"})),
        ("environment", json!({"database_url": "env.sqlite"})),
        ("cli", json!({"database_url": "cli.sqlite"})),
    ]);

    assert_eq!(config.database_url.as_deref(), Some("cli.sqlite"));
}

#[rstest]
fn environment_supplies_database_and_pool_size() {
    let config = load_with(
        &[
            ("REVIEWROTA_DATABASE_URL", Some("env.sqlite")),
            ("REVIEWROTA_MAX_CONNECTIONS", Some("3")),
        ],
        &[],
    );

    assert_eq!(config.database_url.as_deref(), Some("env.sqlite"));
    assert_eq!(config.max_connections, 3);
}

#[rstest]
fn short_flags_override_environment() {
    let config = load_with(
        &[("REVIEWROTA_LISTEN_ADDRESS", Some("127.0.0.1:9000"))],
        &["-d", "cli.sqlite", "-l", "127.0.0.1:9001"],
    );

    assert_eq!(config.database_url.as_deref(), Some("cli.sqlite"));
    assert_eq!(config.listen_address, "127.0.0.1:9001");
}

#[rstest]
fn boolean_flags_load_from_cli() {
    let config = load_with(&[], &["--migrate-db", "--skip-migrations"]);

    assert!(config.migrate_db);
    assert!(config.skip_migrations);
}

#[rstest]
fn validate_accepts_complete_configuration() {
    let config = ReviewRotaConfig {
        database_url: Some("reviewrota.sqlite".to_owned()),
        ..Default::default()
    };

    assert!(config.validate().is_ok());
    assert_eq!(
        config.socket_address().map(|address| address.port()).ok(),
        Some(8080)
    );
}

#[rstest]
#[case::missing_database_url(None, DEFAULT_LISTEN_ADDRESS, 8, "database URL is required")]
#[case::blank_database_url(Some("  "), DEFAULT_LISTEN_ADDRESS, 8, "database URL must not be blank")]
#[case::bad_listen_address(Some("db.sqlite"), "localhost", 8, "invalid listen address")]
#[case::empty_pool(Some("db.sqlite"), DEFAULT_LISTEN_ADDRESS, 0, "max connections must be at least 1")]
fn validate_rejects_unusable_values(
    #[case] database_url: Option<&str>,
    #[case] listen_address: &str,
    #[case] max_connections: u32,
    #[case] expected: &str,
) {
    let config = ReviewRotaConfig {
        database_url: database_url.map(str::to_owned),
        listen_address: listen_address.to_owned(),
        max_connections,
        ..Default::default()
    };

    match config.validate() {
        Err(AppError::Configuration { message }) => assert!(
            message.starts_with(expected),
            "expected message starting with {expected:?}, got {message:?}"
        ),
        other => panic!("expected Configuration error, got {other:?}"),
    }
}

#[rstest]
fn require_database_url_trims_whitespace() {
    let config = ReviewRotaConfig {
        database_url: Some("  db.sqlite ".to_owned()),
        ..Default::default()
    };

    assert_eq!(config.require_database_url().ok(), Some("db.sqlite"));
}
