// 接続セッション
//
// 直近の接続要求から作った接続記述子（設定 + アダプター）を保持する。
// connect で丸ごと置き換え、disconnect で破棄する。TTL は無い。
// 読み手は Arc を複製して使うため、処理中の要求は後続の connect の影響を受けない。

use crate::adapters::engine_adapter::EngineAdapter;
use crate::core::config::{ConnectionConfig, Engine};
use crate::core::error::DatabaseError;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 接続要求
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectRequest {
    /// エンジンタグ（`postgresql`, `mysql`, `sqlserver` とその別名）
    pub engine: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
}

impl ConnectRequest {
    /// 接続設定に変換
    ///
    /// エンジンタグが未対応なら `UnsupportedEngine`。接続確認は行わない。
    pub fn into_config(self) -> Result<ConnectionConfig, DatabaseError> {
        let engine: Engine = self.engine.parse()?;
        Ok(ConnectionConfig {
            host: self.host,
            port: self.port,
            user: self.user,
            password: self.password,
            ..ConnectionConfig::new(engine, self.database)
        })
    }
}

/// 有効な接続記述子
pub struct ActiveConnection {
    config: ConnectionConfig,
    adapter: Arc<dyn EngineAdapter>,
}

impl ActiveConnection {
    pub fn new(config: ConnectionConfig, adapter: Arc<dyn EngineAdapter>) -> Self {
        Self { config, adapter }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn engine(&self) -> Engine {
        self.config.engine
    }

    pub fn adapter(&self) -> &dyn EngineAdapter {
        self.adapter.as_ref()
    }
}

impl std::fmt::Debug for ActiveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveConnection")
            .field("engine", &self.config.engine)
            .field("host", &self.config.host)
            .field("database", &self.config.database)
            .finish()
    }
}

/// 接続セッション
#[derive(Debug, Default)]
pub struct Session {
    active: RwLock<Option<Arc<ActiveConnection>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続記述子を置き換える
    pub async fn replace(&self, connection: ActiveConnection) {
        *self.active.write().await = Some(Arc::new(connection));
    }

    /// 接続記述子を破棄する
    pub async fn clear(&self) {
        *self.active.write().await = None;
    }

    /// 現在の接続記述子
    pub async fn current(&self) -> Option<Arc<ActiveConnection>> {
        self.active.read().await.clone()
    }

    /// 現在の接続記述子（未接続なら `NoActiveConnection`）
    pub async fn require(&self) -> Result<Arc<ActiveConnection>, DatabaseError> {
        self.current().await.ok_or(DatabaseError::NoActiveConnection)
    }
}
