// MySQL アダプター
//
// information_schema（スキーマ DATABASE()）と SHOW CREATE 系の文を使用する。
// 文字列は CAST(... AS CHAR)、数値は CAST(... AS SIGNED) で Any ドライバーの型に揃える。

use super::{
    decode_catalog_rows, decode_column_rows, decode_foreign_keys, decode_names,
    decode_primary_key, dedupe_names,
};
use crate::adapters::database::{with_timeout, DatabaseConnectionService};
use crate::adapters::engine_adapter::{
    synthesize_create_table, EngineAdapter, RawCatalogRow, RawColumnRow, NO_DEFINITION_FOUND,
};
use crate::adapters::sql_quote::quote_identifier_mysql;
use crate::core::best_effort::BestEffort;
use crate::core::config::{ConnectionConfig, Engine};
use crate::core::error::DatabaseError;
use crate::core::lineage::ForeignKeyTarget;
use crate::core::object::ObjectKind;
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Column, Executor, Row};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const COLUMNS_SQL: &str = r#"
    SELECT
        CAST(column_name AS CHAR),
        CAST(data_type AS CHAR),
        CAST(is_nullable AS CHAR),
        CAST(column_default AS CHAR),
        CAST(character_maximum_length AS SIGNED),
        CAST(numeric_precision AS SIGNED),
        CAST(numeric_scale AS SIGNED)
    FROM information_schema.columns
    WHERE table_schema = DATABASE() AND table_name = ?
    ORDER BY ordinal_position
"#;

const PRIMARY_KEY_SQL: &str = r#"
    SELECT CAST(column_name AS CHAR)
    FROM information_schema.statistics
    WHERE table_schema = DATABASE() AND table_name = ? AND index_name = 'PRIMARY'
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        CAST(k.column_name AS CHAR),
        CAST(k.referenced_table_name AS CHAR),
        CAST(k.referenced_column_name AS CHAR)
    FROM information_schema.key_column_usage k
    WHERE k.table_schema = DATABASE()
        AND k.table_name = ?
        AND k.referenced_table_name IS NOT NULL
"#;

// MySQL 8.0.13 以降
const VIEW_DEPENDENCIES_SQL: &str = r#"
    SELECT CAST(table_name AS CHAR)
    FROM information_schema.view_table_usage
    WHERE view_schema = DATABASE() AND view_name = ?
"#;

const CATALOG_SQL: &str = r#"
    SELECT CAST(table_name AS CHAR) AS name, CAST(table_type AS CHAR) AS type
    FROM information_schema.tables
    WHERE table_schema = DATABASE()
    UNION ALL
    SELECT CAST(routine_name AS CHAR) AS name, CAST(routine_type AS CHAR) AS type
    FROM information_schema.routines
    WHERE routine_schema = DATABASE()
    UNION ALL
    SELECT CAST(trigger_name AS CHAR) AS name, 'TRIGGER' AS type
    FROM information_schema.triggers
    WHERE trigger_schema = DATABASE()
"#;

/// MySQL 用アダプター
#[derive(Debug, Clone)]
pub struct MySqlAdapter {
    config: ConnectionConfig,
    connections: DatabaseConnectionService,
}

impl MySqlAdapter {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connections: DatabaseConnectionService::new(),
        }
    }

    async fn fetch_rows(
        &self,
        operation: &str,
        sql: &str,
        bind: Option<&str>,
    ) -> Result<Vec<AnyRow>, DatabaseError> {
        with_timeout(operation, self.config.resolved_timeout(), async {
            let mut conn = self.connections.open_any(&self.config).await?;
            let result = run_query(&mut conn, sql, bind).await;
            self.connections.close_any(conn).await;
            result.map_err(|e| DatabaseError::catalog_query(operation.to_string(), e))
        })
        .await
    }
}

async fn run_query(
    conn: &mut AnyConnection,
    sql: &str,
    bind: Option<&str>,
) -> Result<Vec<AnyRow>, sqlx::Error> {
    match bind {
        Some(value) => sqlx::query(sql).bind(value.to_string()).fetch_all(conn).await,
        // バインド無しは単純クエリで送る（SHOW 系はプリペアできない場合がある）
        None => conn.fetch_all(sql).await,
    }
}

/// SHOW CREATE 文を組み立てる
///
/// 識別子はバインドできないため、バッククォートでクォートする。
fn show_create_statement(object_name: &str, kind: ObjectKind) -> String {
    let keyword = match kind {
        ObjectKind::View => "VIEW",
        ObjectKind::Procedure => "PROCEDURE",
        ObjectKind::Function => "FUNCTION",
        ObjectKind::Trigger => "TRIGGER",
        ObjectKind::Table => "TABLE",
    };
    format!("SHOW CREATE {} {}", keyword, quote_identifier_mysql(object_name))
}

/// 存在しないオブジェクトを示すエラーコード（テーブル/ビュー、ルーチン、トリガー）
const MISSING_OBJECT_CODES: [&str; 3] = ["1146", "1305", "1360"];

/// SHOW CREATE の失敗が「オブジェクトが存在しない」ことによるものか
///
/// エラーコード、または `doesn't exist` / `does not exist` の文言で判定する。
fn is_missing_object(cause: &str) -> bool {
    let lower = cause.to_lowercase();
    lower.contains("doesn't exist")
        || lower.contains("does not exist")
        || MISSING_OBJECT_CODES
            .iter()
            .any(|code| cause.contains(&format!("{} (", code)))
}

/// SHOW CREATE の結果から定義列を取り出す
///
/// 列名は種別ごとに異なる（`Create View`, `Create Procedure`, `SQL Original Statement` ...）。
/// 定義列が無いか NULL なら `None`。値の取り出しに失敗した場合はエラー。
fn extract_show_create(row: &AnyRow, operation: &str) -> Result<Option<String>, DatabaseError> {
    let Some(column) = row.columns().iter().find(|c| {
        let name = c.name();
        name.starts_with("Create ") || name == "SQL Original Statement"
    }) else {
        return Ok(None);
    };
    row.try_get::<Option<String>, _>(column.ordinal())
        .map_err(|e| DatabaseError::catalog_query(operation.to_string(), e))
}

#[async_trait]
impl EngineAdapter for MySqlAdapter {
    fn engine(&self) -> Engine {
        Engine::MySQL
    }

    async fn describe_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, DatabaseError> {
        let rows = self
            .fetch_rows(
                &format!("describe_columns({})", table_name),
                COLUMNS_SQL,
                Some(table_name),
            )
            .await?;
        decode_column_rows(&rows, table_name)
    }

    async fn describe_primary_key(
        &self,
        table_name: &str,
    ) -> Result<HashSet<String>, DatabaseError> {
        let rows = self
            .fetch_rows(
                &format!("describe_primary_key({})", table_name),
                PRIMARY_KEY_SQL,
                Some(table_name),
            )
            .await?;
        decode_primary_key(&rows, table_name)
    }

    async fn describe_foreign_keys(
        &self,
        table_name: &str,
    ) -> Result<HashMap<String, ForeignKeyTarget>, DatabaseError> {
        let rows = self
            .fetch_rows(
                &format!("describe_foreign_keys({})", table_name),
                FOREIGN_KEYS_SQL,
                Some(table_name),
            )
            .await?;
        decode_foreign_keys(&rows, table_name)
    }

    async fn describe_catalog_dependencies(
        &self,
        object_name: &str,
        kind: ObjectKind,
    ) -> BestEffort<Vec<String>> {
        if kind != ObjectKind::View {
            debug!(object = %object_name, kind = %kind, "No catalog dependency source for this kind");
            return BestEffort::absorbed(format!(
                "MySQL exposes catalog dependencies for views only, not {}",
                kind
            ));
        }

        let operation = format!("describe_catalog_dependencies({})", object_name);
        let result = match self
            .fetch_rows(&operation, VIEW_DEPENDENCIES_SQL, Some(object_name))
            .await
        {
            Ok(rows) => decode_names(&rows, "dependency names").map(dedupe_names),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            debug!(object = %object_name, error = %e, "Catalog dependency lookup absorbed");
        }
        BestEffort::from_result(result)
    }

    async fn reconstruct_ddl(
        &self,
        object_name: &str,
        kind: ObjectKind,
    ) -> Result<String, DatabaseError> {
        if kind.is_table() {
            let columns = self.describe_columns(object_name).await?;
            return Ok(synthesize_create_table(object_name, &columns));
        }

        let statement = show_create_statement(object_name, kind);
        let operation = format!("reconstruct_ddl({})", object_name);
        let rows = match self.fetch_rows(&operation, &statement, None).await {
            Ok(rows) => rows,
            // 存在しないオブジェクトは SHOW CREATE がエラーになる
            Err(DatabaseError::CatalogQuery { cause, .. }) if is_missing_object(&cause) => {
                debug!(object = %object_name, "No definition found");
                return Ok(NO_DEFINITION_FOUND.to_string());
            }
            Err(e) => return Err(e),
        };

        let definition = match rows.first() {
            Some(row) => extract_show_create(row, &operation)?,
            None => None,
        };
        Ok(definition
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| NO_DEFINITION_FOUND.to_string()))
    }

    async fn list_catalog(&self) -> Result<Vec<RawCatalogRow>, DatabaseError> {
        let rows = self.fetch_rows("list_catalog", CATALOG_SQL, None).await?;
        decode_catalog_rows(&rows)
    }
}
