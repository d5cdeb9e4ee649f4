// コマンドコンテキストのテスト

use schemalens::cli::command_context::CommandContext;
use schemalens::core::config::Engine;
use tempfile::TempDir;

mod common;

#[test]
fn test_load_missing_config() {
    let temp_dir = TempDir::new().unwrap();
    let err = CommandContext::load(temp_dir.path().to_path_buf()).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
fn test_load_and_resolve_environment() {
    let (_temp_dir, project_path) =
        common::setup_test_project(&common::config_yaml("mysql", "db.local", 3307, "shop", "root"))
            .unwrap();

    let context = CommandContext::load(project_path).unwrap();
    let config = context.connection_config("development").unwrap();

    assert_eq!(config.engine, Engine::MySQL);
    assert_eq!(config.host, "db.local");
    assert_eq!(config.resolved_port(), 3307);
    assert_eq!(config.resolved_timeout(), 5);
    assert_eq!(context.config.inference.api_key_env, "SCHEMALENS_TEST_GEMINI_KEY");
}

#[test]
fn test_unknown_environment() {
    let (_temp_dir, project_path) = common::setup_test_project(&common::config_yaml(
        "postgresql",
        "localhost",
        5432,
        "app",
        "postgres",
    ))
    .unwrap();

    let context = CommandContext::load(project_path).unwrap();
    let err = context.connection_config("production").unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("Config for environment 'production' not found"));
    assert!(message.contains("development"));
}

#[test]
fn test_custom_config_path() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("lineage.yaml");
    std::fs::write(
        &config_path,
        common::config_yaml("sqlserver", "mssql.local", 1433, "erp", "sa"),
    )
    .unwrap();

    let context =
        CommandContext::load_with_config(temp_dir.path().to_path_buf(), Some(config_path.clone()))
            .unwrap();

    assert_eq!(context.config_path, config_path);
    assert_eq!(
        context.connection_config("development").unwrap().engine,
        Engine::SqlServer
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_temp_dir, project_path) = common::setup_test_project(
        r#"version: "1.0"
environments:
  development:
    engine: postgresql
    database: ""
"#,
    )
    .unwrap();

    let err = CommandContext::load(project_path).unwrap_err();
    assert!(format!("{:#}", err).contains("Database name is not specified"));
}

#[test]
fn test_inference_provider_requires_api_key() {
    let (_temp_dir, project_path) =
        common::setup_test_project(&common::config_yaml("mysql", "localhost", 3306, "shop", "root"))
            .unwrap();

    let context = CommandContext::load(project_path).unwrap();
    let err = context.inference_provider().unwrap_err();

    assert!(format!("{:#}", err).contains("SCHEMALENS_TEST_GEMINI_KEY"));
}
