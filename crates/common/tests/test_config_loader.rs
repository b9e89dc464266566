use common::{ConfigLoader, CoreConfig};
use serial_test::serial;
use std::env;
use tempfile::TempDir;

const ENV_VARS: [&str; 5] = [
    "SKILLMESH_DEFAULT_TIMEOUT_MS",
    "SKILLMESH_MAX_CONCURRENCY",
    "SKILLMESH_DEFAULT_SKILL",
    "SKILLMESH_LOG_LEVEL",
    "SKILLMESH_LOG_JSON",
];

fn clear_env() {
    for name in ENV_VARS {
        env::remove_var(name);
    }
}

#[tokio::test]
#[serial]
async fn test_missing_files_yield_defaults() {
    clear_env();
    let dir = TempDir::new().expect("temp dir");
    let loader = ConfigLoader::new().with_paths(vec![dir.path().join("absent.toml")]);

    let config = loader.load().await.expect("load defaults");
    assert_eq!(config, CoreConfig::default());
}

#[tokio::test]
#[serial]
async fn test_toml_file_is_loaded() {
    clear_env();
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("skillmesh.toml");
    std::fs::write(
        &path,
        r#"
[executor]
default_timeout_ms = 1500
max_concurrency = 4

[router]
default_skill = "weather"
"#,
    )
    .expect("write config");

    let config = ConfigLoader::new()
        .with_paths(vec![path])
        .load()
        .await
        .expect("load toml");

    assert_eq!(config.executor.default_timeout_ms, 1500);
    assert_eq!(config.executor.max_concurrency, Some(4));
    assert_eq!(config.router.default_skill, "weather");
    assert_eq!(config.router.default_confidence, 0.5);
}

#[tokio::test]
#[serial]
async fn test_json_file_and_first_match_wins() {
    clear_env();
    let dir = TempDir::new().expect("temp dir");
    let json_path = dir.path().join("skillmesh.json");
    let toml_path = dir.path().join("skillmesh.toml");
    std::fs::write(&json_path, r#"{"complexity": {"batch_chunk_size": 25}}"#).expect("write json");
    std::fs::write(&toml_path, "[complexity]\nbatch_chunk_size = 3\n").expect("write toml");

    let config = ConfigLoader::new()
        .with_paths(vec![json_path, toml_path])
        .load()
        .await
        .expect("load json");

    assert_eq!(config.complexity.batch_chunk_size, 25);
}

#[tokio::test]
#[serial]
async fn test_env_overrides_file() {
    clear_env();
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("skillmesh.toml");
    std::fs::write(&path, "[executor]\ndefault_timeout_ms = 1500\n").expect("write config");

    env::set_var("SKILLMESH_DEFAULT_TIMEOUT_MS", "250");
    env::set_var("SKILLMESH_LOG_JSON", "true");
    env::set_var("SKILLMESH_DEFAULT_SKILL", "product_pricing");

    let config = ConfigLoader::new().with_paths(vec![path]).load().await;
    clear_env();
    let config = config.expect("load with env");

    assert_eq!(config.executor.default_timeout_ms, 250);
    assert!(config.logging.json);
    assert_eq!(config.router.default_skill, "product_pricing");
}

#[tokio::test]
#[serial]
async fn test_invalid_env_value_is_an_error() {
    clear_env();
    env::set_var("SKILLMESH_MAX_CONCURRENCY", "many");

    let result = ConfigLoader::new().with_paths(Vec::new()).load().await;
    clear_env();

    let err = result.expect_err("invalid concurrency");
    assert!(err.to_string().contains("MAX_CONCURRENCY"));
}

#[tokio::test]
#[serial]
async fn test_save_then_load() {
    clear_env();
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("config.toml");
    let mut config = CoreConfig::default();
    config.executor.default_timeout_ms = 9000;

    let loader = ConfigLoader::new().with_paths(vec![path.clone()]);
    loader.save_config(&config, &path).await.expect("save");

    let loaded = loader.load().await.expect("reload");
    assert_eq!(loaded.executor.default_timeout_ms, 9000);
}
