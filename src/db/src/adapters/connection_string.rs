// 接続文字列ビルダー
//
// ConnectionConfig から各エンジンの接続情報を生成する。
// PostgreSQL/MySQL は sqlx の URL、SQL Server は tiberius の Config。

use crate::core::config::{ConnectionConfig, Engine};
use tiberius::{AuthMethod, EncryptionLevel};
use urlencoding::encode;

/// sqlx 用の接続URLを生成
///
/// ユーザー名とパスワードはパーセントエンコードされます。
/// これにより、`@`, `:`, `/`, `#`, `?` などの特殊文字を含むパスワードでも
/// 正しく接続文字列が構築されます。SQL Server は URL を使わないため None。
pub fn build_connection_url(config: &ConnectionConfig) -> Option<String> {
    let scheme = match config.engine {
        Engine::PostgreSQL => "postgresql",
        Engine::MySQL => "mysql",
        Engine::SqlServer => return None,
    };

    let default_user = match config.engine {
        Engine::PostgreSQL => "postgres",
        _ => "root",
    };
    let user = config.user.as_deref().unwrap_or(default_user);
    let encoded_user = encode(user);
    let auth = match config.password.as_deref() {
        Some(password) if !password.is_empty() => {
            format!("{}:{}", encoded_user, encode(password))
        }
        _ => encoded_user.to_string(),
    };

    Some(format!(
        "{}://{}@{}:{}/{}",
        scheme,
        auth,
        config.host,
        config.resolved_port(),
        config.database
    ))
}

/// SQL Server (tiberius) 用の接続設定を生成
///
/// 暗号化は `encrypt` が true の場合のみ必須にし、サーバー証明書は常に信頼します。
pub fn build_sqlserver_config(config: &ConnectionConfig) -> tiberius::Config {
    let mut tds = tiberius::Config::new();
    tds.host(&config.host);
    tds.port(config.resolved_port());
    tds.database(&config.database);
    tds.authentication(AuthMethod::sql_server(
        config.user.as_deref().unwrap_or("sa"),
        config.password.as_deref().unwrap_or(""),
    ));

    if config.encrypt.unwrap_or(false) {
        tds.encryption(EncryptionLevel::Required);
    } else {
        tds.encryption(EncryptionLevel::Off);
    }
    tds.trust_cert();

    tds
}
