// データベース接続アダプター
//
// 呼び出しごとに1本の接続を開いて閉じる。プールや接続の再利用は行わない。
// PostgreSQL/MySQL は SQLx の AnyConnection、SQL Server は tiberius を使用します。

use crate::adapters::connection_string::{build_connection_url, build_sqlserver_config};
use crate::core::config::ConnectionConfig;
use crate::core::error::DatabaseError;
use sqlx::{AnyConnection, Connection};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// SQL Server クライアント
pub type SqlServerClient = tiberius::Client<Compat<TcpStream>>;

/// データベース接続サービス
///
/// 単発接続の確立と、カタログ呼び出しのタイムアウト制御を行います。
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService;

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self
    }

    /// SQLx の単発接続を開く（PostgreSQL/MySQL）
    pub async fn open_any(&self, config: &ConnectionConfig) -> Result<AnyConnection, DatabaseError> {
        sqlx::any::install_default_drivers();

        let url = build_connection_url(config).ok_or_else(|| {
            DatabaseError::connection(
                format!("Engine {} has no URL-based driver", config.engine),
                "use the SQL Server client instead",
            )
        })?;

        AnyConnection::connect(&url).await.map_err(|e| {
            DatabaseError::connection(
                format!(
                    "Failed to connect to {} at {}:{}",
                    config.engine,
                    config.host,
                    config.resolved_port()
                ),
                e,
            )
        })
    }

    /// SQL Server の単発接続を開く
    pub async fn open_sqlserver(
        &self,
        config: &ConnectionConfig,
    ) -> Result<SqlServerClient, DatabaseError> {
        let tds = build_sqlserver_config(config);
        let address = tds.get_addr();

        let tcp = TcpStream::connect(&address).await.map_err(|e| {
            DatabaseError::connection(format!("Failed to reach SQL Server at {}", address), e)
        })?;
        tcp.set_nodelay(true).map_err(|e| {
            DatabaseError::connection(format!("Failed to configure socket for {}", address), e)
        })?;

        tiberius::Client::connect(tds, tcp.compat_write())
            .await
            .map_err(|e| {
                DatabaseError::connection(format!("Failed to log in to SQL Server at {}", address), e)
            })
    }

    /// SQLx 接続を閉じる
    ///
    /// クローズ時の失敗は結果に影響させない（問い合わせ結果は既に確定している）。
    pub async fn close_any(&self, conn: AnyConnection) {
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Failed to close connection cleanly");
        }
    }

    /// SQL Server 接続を閉じる
    pub async fn close_sqlserver(&self, client: SqlServerClient) {
        if let Err(e) = client.close().await {
            tracing::debug!(error = %e, "Failed to close SQL Server connection cleanly");
        }
    }
}

/// カタログ呼び出しにタイムアウトを適用
///
/// 期限切れは `DatabaseError::Timeout` として返します。
pub async fn with_timeout<T, F>(operation: &str, seconds: u64, future: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    match tokio::time::timeout(Duration::from_secs(seconds), future).await {
        Ok(result) => result,
        Err(_) => Err(DatabaseError::Timeout {
            operation: operation.to_string(),
            seconds,
        }),
    }
}
