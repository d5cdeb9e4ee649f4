// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）のモデル、検証、
// 環境別のデータベース接続設定と推論プロバイダー設定を扱います。

use crate::core::error::{ConfigError, DatabaseError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// データベースエンジン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "postgresql", alias = "postgres")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlserver", alias = "mssql")]
    SqlServer,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::PostgreSQL => write!(f, "postgresql"),
            Engine::MySQL => write!(f, "mysql"),
            Engine::SqlServer => write!(f, "sqlserver"),
        }
    }
}

impl FromStr for Engine {
    type Err = DatabaseError;

    /// エンジンタグを解析
    ///
    /// 大文字小文字は区別しません。未対応のタグは `UnsupportedEngine` になります。
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Engine::PostgreSQL),
            "mysql" => Ok(Engine::MySQL),
            "sqlserver" | "mssql" => Ok(Engine::SqlServer),
            _ => Err(DatabaseError::UnsupportedEngine {
                engine: tag.to_string(),
            }),
        }
    }
}

impl Engine {
    /// Engineに応じたデフォルトポートを返す
    ///
    /// - PostgreSQL: 5432
    /// - MySQL: 3306
    /// - SQL Server: 1433
    pub fn default_port(&self) -> u16 {
        match self {
            Engine::PostgreSQL => 5432,
            Engine::MySQL => 3306,
            Engine::SqlServer => 1433,
        }
    }

    /// 対応エンジン一覧
    pub fn all() -> [Engine; 3] {
        [Engine::PostgreSQL, Engine::MySQL, Engine::SqlServer]
    }
}

/// プロジェクト設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// 環境別のデータベース設定
    pub environments: HashMap<String, ConnectionConfig>,

    /// 推論プロバイダー設定
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 指定された環境のデータベース設定を取得
    pub fn get_connection_config(&self, environment: &str) -> Result<ConnectionConfig, ConfigError> {
        self.environments.get(environment).cloned().ok_or_else(|| {
            let mut available: Vec<String> = self.environments.keys().cloned().collect();
            available.sort();
            ConfigError::EnvironmentNotFound {
                name: environment.to_string(),
                available,
            }
        })
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(ConfigError::MissingVersion);
        }

        if self.environments.is_empty() {
            return Err(ConfigError::NoEnvironments);
        }

        for (env_name, connection) in &self.environments {
            connection
                .validate()
                .map_err(|source| ConfigError::InvalidEnvironment {
                    environment: env_name.clone(),
                    source: Box::new(source),
                })?;
        }

        Ok(())
    }
}

/// データベース接続設定
///
/// 接続リクエスト（engine, host, port, user, password, database）と1対1で対応します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// データベースエンジン
    pub engine: Engine,

    /// ホスト名
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号（Noneの場合はEngineのデフォルトポートを使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// データベース名
    pub database: String,

    /// ユーザー名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// パスワード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// カタログ呼び出し1回あたりのタイムアウト（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// 通信を暗号化するか（SQL Server用、未指定時は暗号化しない）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt: Option<bool>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl ConnectionConfig {
    /// 既定のタイムアウト（秒）
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// 最小限の項目から接続設定を作成
    pub fn new(engine: Engine, database: impl Into<String>) -> Self {
        Self {
            engine,
            host: default_host(),
            port: None,
            database: database.into(),
            user: None,
            password: None,
            timeout: None,
            encrypt: None,
        }
    }

    /// 解決済みポート番号を取得
    pub fn resolved_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.engine.default_port())
    }

    /// 解決済みタイムアウト（秒）を取得
    pub fn resolved_timeout(&self) -> u64 {
        self.timeout.unwrap_or(Self::DEFAULT_TIMEOUT_SECS)
    }

    /// 接続設定を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.is_empty() {
            return Err(ConfigError::MissingDatabaseName);
        }
        if self.host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.timeout == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }
}

/// 推論プロバイダー設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// モデル名
    #[serde(default = "default_model")]
    pub model: String,

    /// APIキーを読み込む環境変数名
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// APIのベースURL（テストや社内プロキシ向け）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// リクエストタイムアウト（秒）
    #[serde(default = "default_inference_timeout")]
    pub timeout: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_inference_timeout() -> u64 {
    60
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout: default_inference_timeout(),
        }
    }
}
