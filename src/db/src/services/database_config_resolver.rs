// 接続設定の解決サービス
//
// 環境変数による上書きをCLI/サービス層で扱い、coreは純粋な構造体に保つ。

use crate::core::config::{ConnectionConfig, Engine};
use crate::core::error::DatabaseError;

/// 接続設定の解決ユーティリティ
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfigResolver;

impl ConnectionConfigResolver {
    /// 環境変数による上書きを適用
    ///
    /// `DB_ENGINE`, `DB_HOST`, `DB_PORT`, `DB_DATABASE`, `DB_USER`, `DB_PASSWORD` を参照します。
    pub fn apply_env_overrides(base: &ConnectionConfig) -> Result<ConnectionConfig, DatabaseError> {
        Self::apply_overrides_from(base, |key| std::env::var(key).ok())
    }

    /// 任意の参照関数から上書きを適用
    ///
    /// # Arguments
    ///
    /// * `base` - 設定ファイル由来の接続設定
    /// * `lookup` - 変数名から値を返す関数
    ///
    /// # Returns
    ///
    /// 上書き済みの接続設定。`DB_ENGINE` が未対応の値なら `UnsupportedEngine`
    pub fn apply_overrides_from<F>(
        base: &ConnectionConfig,
        lookup: F,
    ) -> Result<ConnectionConfig, DatabaseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base.clone();

        if let Some(engine) = lookup("DB_ENGINE") {
            config.engine = engine.parse::<Engine>()?;
        }
        if let Some(host) = lookup("DB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            match port.parse::<u16>() {
                Ok(port_num) => config.port = Some(port_num),
                Err(_) => tracing::warn!(value = %port, "Ignoring non-numeric DB_PORT"),
            }
        }
        if let Some(database) = lookup("DB_DATABASE") {
            config.database = database;
        }
        if let Some(user) = lookup("DB_USER") {
            config.user = Some(user);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            config.password = Some(password);
        }

        Ok(config)
    }
}
