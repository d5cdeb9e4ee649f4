// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、DatabaseError, InferenceError, AnalysisError, ConfigError を定義します。

use thiserror::Error;

/// データベースエラー
///
/// 接続状態の不備やカタログ問い合わせの失敗を表現します。
/// ドライバー由来の失敗は常に元のメッセージ（cause）を保持します。
#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    /// 接続前にイントロスペクション/解析が呼ばれた
    #[error("No active connection. Connect to a database first")]
    NoActiveConnection,

    /// 未対応のエンジンタグ
    #[error("Unsupported database engine: {engine}. Please specify one of: postgresql, mysql, sqlserver")]
    UnsupportedEngine {
        /// 指定されたエンジンタグ
        engine: String,
    },

    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// 原因
        cause: String,
    },

    /// Catalog query error
    #[error("Catalog query error: {message} (cause: {cause})")]
    CatalogQuery {
        /// エラーメッセージ
        message: String,
        /// 原因（ドライバーのメッセージ）
        cause: String,
    },

    /// Catalog call timed out
    #[error("Catalog call timed out after {seconds}s: {operation}")]
    Timeout {
        /// 実行していた操作
        operation: String,
        /// タイムアウト秒数
        seconds: u64,
    },
}

impl DatabaseError {
    /// 未接続エラーかどうか
    pub fn is_no_active_connection(&self) -> bool {
        matches!(self, DatabaseError::NoActiveConnection)
    }

    /// 未対応エンジンエラーかどうか
    pub fn is_unsupported_engine(&self) -> bool {
        matches!(self, DatabaseError::UnsupportedEngine { .. })
    }

    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// カタログ問い合わせエラーかどうか
    pub fn is_catalog_query(&self) -> bool {
        matches!(self, DatabaseError::CatalogQuery { .. })
    }

    /// タイムアウトかどうか
    pub fn is_timeout(&self) -> bool {
        matches!(self, DatabaseError::Timeout { .. })
    }

    /// カタログ問い合わせエラーを作成
    pub fn catalog_query(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        DatabaseError::CatalogQuery {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    /// 接続エラーを作成
    pub fn connection(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        DatabaseError::Connection {
            message: message.into(),
            cause: cause.to_string(),
        }
    }
}

/// 推論プロバイダーエラー
///
/// 外部の推論プロバイダーの失敗、または解析不能な応答を表現します。
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// APIキーなどが未設定
    #[error("Inference provider is not configured: {message}")]
    NotConfigured {
        /// エラーメッセージ
        message: String,
    },

    /// レート制限・クォータ超過
    #[error("Inference quota exceeded, try again later: {message}")]
    RateLimited {
        /// エラーメッセージ
        message: String,
    },

    /// プロバイダー側の失敗（認証、通信など）
    #[error("Inference provider error: {message}")]
    Provider {
        /// エラーメッセージ
        message: String,
    },

    /// 応答をAnalysisResultとして解析できない
    #[error("Failed to parse inference response: {message}")]
    MalformedResponse {
        /// エラーメッセージ
        message: String,
    },
}

impl InferenceError {
    /// レート制限かどうか
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, InferenceError::RateLimited { .. })
    }

    /// 応答の解析失敗かどうか
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, InferenceError::MalformedResponse { .. })
    }
}

/// 解析パイプライン全体のエラー
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl AnalysisError {
    /// 「時間をおいて再試行」を案内すべきかどうか
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AnalysisError::Inference(e) if e.is_rate_limited())
    }
}

/// 設定ファイルエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// バージョン未指定
    #[error("Config file version is not specified")]
    MissingVersion,

    /// 環境設定が空
    #[error("At least one environment configuration is required")]
    NoEnvironments,

    /// 環境が見つからない
    #[error("Environment '{name}' not found. Available environments: {available:?}")]
    EnvironmentNotFound {
        /// 指定された環境名
        name: String,
        /// 利用可能な環境名
        available: Vec<String>,
    },

    /// データベース名未指定
    #[error("Database name is not specified")]
    MissingDatabaseName,

    /// ホスト名未指定
    #[error("Database host is not specified")]
    MissingHost,

    /// タイムアウトが0
    #[error("Timeout must be greater than zero seconds")]
    InvalidTimeout,

    /// 環境ごとの検証エラー
    #[error("Invalid config for environment '{environment}': {source}")]
    InvalidEnvironment {
        /// 環境名
        environment: String,
        /// 元のエラー
        #[source]
        source: Box<ConfigError>,
    },
}
