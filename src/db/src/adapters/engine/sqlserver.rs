// SQL Server アダプター
//
// INFORMATION_SCHEMA と sys.dm_sql_referenced_entities / OBJECT_DEFINITION を使用する。
// ドライバーは tiberius。数値列は BIGINT にキャストして i64 で受け取る。

use crate::adapters::database::{with_timeout, DatabaseConnectionService, SqlServerClient};
use crate::adapters::engine_adapter::{
    synthesize_create_table, EngineAdapter, RawCatalogRow, RawColumnRow, NO_DEFINITION_FOUND,
};
use crate::adapters::sql_quote::quote_identifier_sqlserver;
use crate::core::best_effort::BestEffort;
use crate::core::config::{ConnectionConfig, Engine};
use crate::core::error::DatabaseError;
use crate::core::lineage::ForeignKeyTarget;
use crate::core::object::ObjectKind;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tiberius::Row;
use tracing::debug;

const COLUMNS_SQL: &str = r#"
    SELECT
        COLUMN_NAME,
        DATA_TYPE,
        IS_NULLABLE,
        COLUMN_DEFAULT,
        CAST(CHARACTER_MAXIMUM_LENGTH AS BIGINT),
        CAST(NUMERIC_PRECISION AS BIGINT),
        CAST(NUMERIC_SCALE AS BIGINT)
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_NAME = @P1
    ORDER BY ORDINAL_POSITION
"#;

const PRIMARY_KEY_SQL: &str = r#"
    SELECT kcu.COLUMN_NAME
    FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
    JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
        ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
        AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
    WHERE tc.TABLE_NAME = @P1 AND tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        kcu.COLUMN_NAME,
        ccu.TABLE_NAME AS referenced_table,
        ccu.COLUMN_NAME AS referenced_column
    FROM INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
    JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
        ON rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
    JOIN INFORMATION_SCHEMA.CONSTRAINT_COLUMN_USAGE ccu
        ON rc.UNIQUE_CONSTRAINT_NAME = ccu.CONSTRAINT_NAME
    WHERE kcu.TABLE_NAME = @P1
"#;

const DEPENDENCIES_SQL: &str = r#"
    SELECT DISTINCT referenced_entity_name
    FROM sys.dm_sql_referenced_entities(@P1, 'OBJECT')
    WHERE referenced_minor_name IS NULL
"#;

const DEFINITION_SQL: &str = "SELECT OBJECT_DEFINITION(OBJECT_ID(@P1))";

const CATALOG_SQL: &str = r#"
    SELECT CAST(TABLE_NAME AS NVARCHAR(128)) AS name, CAST(TABLE_TYPE AS NVARCHAR(20)) AS type
    FROM INFORMATION_SCHEMA.TABLES
    UNION ALL
    SELECT CAST(ROUTINE_NAME AS NVARCHAR(128)), CAST(ROUTINE_TYPE AS NVARCHAR(20))
    FROM INFORMATION_SCHEMA.ROUTINES
    UNION ALL
    SELECT CAST(name AS NVARCHAR(128)), CAST('TRIGGER' AS NVARCHAR(20))
    FROM sys.triggers
"#;

/// SQL Server 用アダプター
#[derive(Debug, Clone)]
pub struct SqlServerAdapter {
    config: ConnectionConfig,
    connections: DatabaseConnectionService,
}

impl SqlServerAdapter {
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
        param: Option<&str>,
    ) -> Result<Vec<Row>, DatabaseError> {
        with_timeout(operation, self.config.resolved_timeout(), async {
            let mut client = self.connections.open_sqlserver(&self.config).await?;
            let result = run_query(&mut client, sql, param).await;
            self.connections.close_sqlserver(client).await;
            result.map_err(|e| DatabaseError::catalog_query(operation.to_string(), e))
        })
        .await
    }
}

async fn run_query(
    client: &mut SqlServerClient,
    sql: &str,
    param: Option<&str>,
) -> Result<Vec<Row>, tiberius::error::Error> {
    let stream = match param {
        Some(value) => {
            let value = value.to_string();
            client.query(sql, &[&value]).await?
        }
        None => client.simple_query(sql).await?,
    };
    stream.into_first_result().await
}

fn get_text(row: &Row, index: usize) -> Result<Option<String>, tiberius::error::Error> {
    Ok(row.try_get::<&str, _>(index)?.map(str::to_string))
}

fn require_text(row: &Row, index: usize) -> Result<String, tiberius::error::Error> {
    Ok(get_text(row, index)?.unwrap_or_default())
}

fn decode_columns(rows: &[Row]) -> Result<Vec<RawColumnRow>, tiberius::error::Error> {
    rows.iter()
        .map(|row| {
            Ok(RawColumnRow {
                name: require_text(row, 0)?,
                data_type: require_text(row, 1)?,
                is_nullable: RawColumnRow::parse_nullable(&require_text(row, 2)?),
                default_value: get_text(row, 3)?,
                char_max_length: row.try_get::<i64, _>(4)?,
                numeric_precision: row.try_get::<i64, _>(5)?,
                numeric_scale: row.try_get::<i64, _>(6)?,
            })
        })
        .collect()
}

fn decode_first_column(rows: &[Row]) -> Result<Vec<String>, tiberius::error::Error> {
    let mut names = Vec::new();
    for row in rows {
        if let Some(name) = get_text(row, 0)? {
            names.push(name);
        }
    }
    Ok(names)
}

#[async_trait]
impl EngineAdapter for SqlServerAdapter {
    fn engine(&self) -> Engine {
        Engine::SqlServer
    }

    async fn describe_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, DatabaseError> {
        let rows = self
            .fetch_rows(
                &format!("describe_columns({})", table_name),
                COLUMNS_SQL,
                Some(table_name),
            )
            .await?;
        decode_columns(&rows).map_err(|e| {
            DatabaseError::catalog_query(format!("Failed to decode columns of {}", table_name), e)
        })
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
        let names = decode_first_column(&rows).map_err(|e| {
            DatabaseError::catalog_query(
                format!("Failed to decode primary key of {}", table_name),
                e,
            )
        })?;
        Ok(names.into_iter().collect())
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

        let fail = |e: tiberius::error::Error| {
            DatabaseError::catalog_query(
                format!("Failed to decode foreign keys of {}", table_name),
                e,
            )
        };

        let mut foreign_keys = HashMap::new();
        for row in &rows {
            let column = require_text(row, 0).map_err(fail)?;
            let table = require_text(row, 1).map_err(fail)?;
            let referenced = require_text(row, 2).map_err(fail)?;
            foreign_keys.insert(column, ForeignKeyTarget::new(table, referenced));
        }
        Ok(foreign_keys)
    }

    async fn describe_catalog_dependencies(
        &self,
        object_name: &str,
        _kind: ObjectKind,
    ) -> BestEffort<Vec<String>> {
        let operation = format!("describe_catalog_dependencies({})", object_name);
        let quoted = quote_identifier_sqlserver(object_name);

        let result = match self
            .fetch_rows(&operation, DEPENDENCIES_SQL, Some(&quoted))
            .await
        {
            Ok(rows) => decode_first_column(&rows)
                .map(super::dedupe_names)
                .map_err(|e| DatabaseError::catalog_query("Failed to decode dependency names", e)),
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

        let quoted = quote_identifier_sqlserver(object_name);
        let rows = self
            .fetch_rows(
                &format!("reconstruct_ddl({})", object_name),
                DEFINITION_SQL,
                Some(&quoted),
            )
            .await?;

        let definition = match rows.first() {
            Some(row) => get_text(row, 0).map_err(|e| {
                DatabaseError::catalog_query(
                    format!("Failed to decode definition of {}", object_name),
                    e,
                )
            })?,
            None => None,
        };

        Ok(definition
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| NO_DEFINITION_FOUND.to_string()))
    }

    async fn list_catalog(&self) -> Result<Vec<RawCatalogRow>, DatabaseError> {
        let rows = self.fetch_rows("list_catalog", CATALOG_SQL, None).await?;

        rows.iter()
            .map(|row| Ok(RawCatalogRow::new(require_text(row, 0)?, get_text(row, 1)?)))
            .collect::<Result<Vec<_>, tiberius::error::Error>>()
            .map_err(|e| DatabaseError::catalog_query("Failed to decode catalog listing", e))
    }
}
