// コマンド共通コンテキスト
//
// 設定ファイル読み込み、接続設定の解決、サービスと推論プロバイダーの
// 組み立てをCLI層で集約する。

use crate::core::config::{Config, ConnectionConfig};
use crate::services::config_loader::ConfigLoader;
use crate::services::database_config_resolver::ConnectionConfigResolver;
use crate::services::inference::gemini::GeminiProvider;
use crate::services::lineage_service::LineageService;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Create {} with at least one environment.",
                config_path,
                Config::DEFAULT_CONFIG_PATH
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 環境に応じた接続設定を取得（環境変数上書き込み）
    pub fn connection_config(&self, env: &str) -> Result<ConnectionConfig> {
        let config = self
            .config
            .get_connection_config(env)
            .with_context(|| format!("Config for environment '{}' not found", env))?;
        ConnectionConfigResolver::apply_env_overrides(&config)
            .with_context(|| "Invalid DB_* environment override")
    }

    /// 指定環境に接続済みのサービスを作成
    pub async fn connected_service(&self, env: &str) -> Result<LineageService> {
        let config = self.connection_config(env)?;
        let service = LineageService::new();
        service.connect_with_config(config).await;
        Ok(service)
    }

    /// 設定に従って推論プロバイダーを作成
    pub fn inference_provider(&self) -> Result<GeminiProvider> {
        GeminiProvider::from_config(&self.config.inference)
            .with_context(|| "Inference provider is not configured")
    }
}
