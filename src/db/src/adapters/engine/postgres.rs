// PostgreSQL アダプター
//
// information_schema（スキーマ public）と pg_catalog の定義関数を使用する。
// information_schema のドメイン型は Any ドライバーで直接デコードできないため、
// 文字列は ::text、数値は ::int8 にキャストして取得する。

use super::{
    decode_catalog_rows, decode_column_rows, decode_foreign_keys, decode_names,
    decode_primary_key, dedupe_names,
};
use crate::adapters::database::{with_timeout, DatabaseConnectionService};
use crate::adapters::engine_adapter::{
    synthesize_create_table, EngineAdapter, RawCatalogRow, RawColumnRow, NO_DEFINITION_FOUND,
};
use crate::core::best_effort::BestEffort;
use crate::core::config::{ConnectionConfig, Engine};
use crate::core::error::DatabaseError;
use crate::core::lineage::ForeignKeyTarget;
use crate::core::object::ObjectKind;
use async_trait::async_trait;
use sqlx::{AnyConnection, Executor, Row};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const COLUMNS_SQL: &str = r#"
    SELECT
        column_name::text,
        data_type::text,
        is_nullable::text,
        column_default::text,
        character_maximum_length::int8,
        numeric_precision::int8,
        numeric_scale::int8
    FROM information_schema.columns
    WHERE table_name = $1 AND table_schema = 'public'
    ORDER BY ordinal_position
"#;

const PRIMARY_KEY_SQL: &str = r#"
    SELECT kcu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
    WHERE tc.constraint_type = 'PRIMARY KEY'
        AND tc.table_name = $1
        AND tc.table_schema = 'public'
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        kcu.column_name::text,
        ccu.table_name::text AS referenced_table,
        ccu.column_name::text AS referenced_column
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage ccu
        ON ccu.constraint_name = tc.constraint_name
        AND ccu.table_schema = tc.table_schema
    WHERE tc.constraint_type = 'FOREIGN KEY'
        AND tc.table_name = $1
        AND tc.table_schema = 'public'
"#;

const VIEW_DEPENDENCIES_SQL: &str = r#"
    SELECT table_name::text
    FROM information_schema.view_table_usage
    WHERE view_name = $1 AND view_schema = 'public'
"#;

const ROUTINE_DEPENDENCIES_SQL: &str = r#"
    SELECT table_name::text
    FROM information_schema.routine_table_usage
    WHERE routine_name = $1 AND routine_schema = 'public'
"#;

const VIEW_DEFINITION_SQL: &str = r#"
    SELECT pg_get_viewdef(c.oid, true)
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relname = $1 AND n.nspname = 'public' AND c.relkind IN ('v', 'm')
    LIMIT 1
"#;

const FUNCTION_DEFINITION_SQL: &str = r#"
    SELECT pg_get_functiondef(p.oid)
    FROM pg_proc p
    JOIN pg_namespace n ON n.oid = p.pronamespace
    WHERE p.proname = $1 AND n.nspname = 'public'
    LIMIT 1
"#;

const TRIGGER_DEFINITION_SQL: &str = r#"
    SELECT pg_get_triggerdef(t.oid, true)
    FROM pg_trigger t
    WHERE t.tgname = $1 AND NOT t.tgisinternal
    LIMIT 1
"#;

const CATALOG_SQL: &str = r#"
    SELECT table_name::text AS name, table_type::text AS type
    FROM information_schema.tables
    WHERE table_schema = 'public'
    UNION ALL
    SELECT routine_name::text AS name, routine_type::text AS type
    FROM information_schema.routines
    WHERE routine_schema = 'public'
    UNION ALL
    SELECT DISTINCT trigger_name::text AS name, 'TRIGGER' AS type
    FROM information_schema.triggers
    WHERE event_object_schema = 'public'
"#;

/// PostgreSQL 用アダプター
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    config: ConnectionConfig,
    connections: DatabaseConnectionService,
}

impl PostgresAdapter {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connections: DatabaseConnectionService::new(),
        }
    }

    /// 接続を開き、問い合わせ後に必ず閉じる
    async fn fetch_rows(
        &self,
        operation: &str,
        sql: &str,
        bind: Option<&str>,
    ) -> Result<Vec<sqlx::any::AnyRow>, DatabaseError> {
        with_timeout(operation, self.config.resolved_timeout(), async {
            let mut conn = self.connections.open_any(&self.config).await?;
            let result = run_query(&mut conn, sql, bind).await;
            self.connections.close_any(conn).await;
            result.map_err(|e| DatabaseError::catalog_query(operation.to_string(), e))
        })
        .await
    }

    async fn fetch_definition(
        &self,
        object_name: &str,
        kind: ObjectKind,
    ) -> Result<String, DatabaseError> {
        let sql = match kind {
            ObjectKind::View => VIEW_DEFINITION_SQL,
            ObjectKind::Trigger => TRIGGER_DEFINITION_SQL,
            _ => FUNCTION_DEFINITION_SQL,
        };
        let rows = self
            .fetch_rows(
                &format!("reconstruct_ddl({})", object_name),
                sql,
                Some(object_name),
            )
            .await?;

        let definition = match rows.first() {
            Some(row) => row.try_get::<Option<String>, _>(0).map_err(|e| {
                DatabaseError::catalog_query(
                    format!("Failed to decode definition of {}", object_name),
                    e,
                )
            })?,
            None => None,
        };

        Ok(definition
            .filter(|d| !d.trim().is_empty())
            .map(|d| match kind {
                // pg_get_viewdef はクエリ本体のみを返す
                ObjectKind::View => format!("CREATE OR REPLACE VIEW {} AS\n{}", object_name, d),
                _ => d,
            })
            .unwrap_or_else(|| NO_DEFINITION_FOUND.to_string()))
    }
}

async fn run_query(
    conn: &mut AnyConnection,
    sql: &str,
    bind: Option<&str>,
) -> Result<Vec<sqlx::any::AnyRow>, sqlx::Error> {
    match bind {
        Some(value) => sqlx::query(sql).bind(value.to_string()).fetch_all(conn).await,
        // バインド無しは単純クエリで送る
        None => conn.fetch_all(sql).await,
    }
}

#[async_trait]
impl EngineAdapter for PostgresAdapter {
    fn engine(&self) -> Engine {
        Engine::PostgreSQL
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
        let sql = match kind {
            ObjectKind::View => VIEW_DEPENDENCIES_SQL,
            _ => ROUTINE_DEPENDENCIES_SQL,
        };
        let operation = format!("describe_catalog_dependencies({})", object_name);

        let result = match self.fetch_rows(&operation, sql, Some(object_name)).await {
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
        self.fetch_definition(object_name, kind).await
    }

    async fn list_catalog(&self) -> Result<Vec<RawCatalogRow>, DatabaseError> {
        let rows = self.fetch_rows("list_catalog", CATALOG_SQL, None).await?;
        decode_catalog_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine() {
        let adapter = PostgresAdapter::new(ConnectionConfig::new(Engine::PostgreSQL, "app"));
        assert_eq!(adapter.engine(), Engine::PostgreSQL);
    }

    #[test]
    fn test_queries_target_public_schema() {
        for sql in [COLUMNS_SQL, PRIMARY_KEY_SQL, FOREIGN_KEYS_SQL, CATALOG_SQL] {
            assert!(sql.contains("'public'"));
        }
    }

    #[tokio::test]
    async fn test_catalog_dependencies_absorb_connection_failure() {
        let mut config = ConnectionConfig::new(Engine::PostgreSQL, "app");
        config.host = "127.0.0.1".to_string();
        config.port = Some(1);
        config.timeout = Some(5);
        let adapter = PostgresAdapter::new(config);

        let result = adapter
            .describe_catalog_dependencies("orders_view", ObjectKind::View)
            .await;

        assert!(result.is_absorbed());
    }
}
