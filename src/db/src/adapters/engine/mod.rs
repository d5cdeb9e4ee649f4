// エンジン別アダプター実装
//
// PostgreSQL/MySQL は SQLx の AnyConnection、SQL Server は tiberius で問い合わせる。
// SQLx 系の行デコードはここで共通化する。

pub mod mysql;
pub mod postgres;
pub mod sqlserver;

use crate::adapters::engine_adapter::{RawCatalogRow, RawColumnRow};
use crate::core::error::DatabaseError;
use crate::core::lineage::ForeignKeyTarget;
use sqlx::any::AnyRow;
use sqlx::Row;
use std::collections::{HashMap, HashSet};

/// カラム行をデコード
///
/// 列順は `name, data_type, is_nullable, default, length, precision, scale` を前提とする。
pub(crate) fn decode_column_rows(
    rows: &[AnyRow],
    table_name: &str,
) -> Result<Vec<RawColumnRow>, DatabaseError> {
    rows.iter()
        .map(|row| {
            Ok(RawColumnRow {
                name: row.try_get(0)?,
                data_type: row.try_get(1)?,
                is_nullable: RawColumnRow::parse_nullable(&row.try_get::<String, _>(2)?),
                default_value: row.try_get(3)?,
                char_max_length: row.try_get(4)?,
                numeric_precision: row.try_get(5)?,
                numeric_scale: row.try_get(6)?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|e| {
            DatabaseError::catalog_query(format!("Failed to decode columns of {}", table_name), e)
        })
}

/// 先頭列の文字列を集める（主キー、依存テーブル名など）
pub(crate) fn decode_names(rows: &[AnyRow], context: &str) -> Result<Vec<String>, DatabaseError> {
    rows.iter()
        .map(|row| row.try_get::<String, _>(0))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DatabaseError::catalog_query(format!("Failed to decode {}", context), e))
}

/// 主キー行を集合に変換
pub(crate) fn decode_primary_key(
    rows: &[AnyRow],
    table_name: &str,
) -> Result<HashSet<String>, DatabaseError> {
    let names = decode_names(rows, &format!("primary key of {}", table_name))?;
    Ok(names.into_iter().collect())
}

/// 外部キー行（`column, referenced_table, referenced_column`）をマップに変換
pub(crate) fn decode_foreign_keys(
    rows: &[AnyRow],
    table_name: &str,
) -> Result<HashMap<String, ForeignKeyTarget>, DatabaseError> {
    let fail = |e: sqlx::Error| {
        DatabaseError::catalog_query(format!("Failed to decode foreign keys of {}", table_name), e)
    };

    let mut foreign_keys = HashMap::new();
    for row in rows {
        let column: String = row.try_get(0).map_err(fail)?;
        let table: String = row.try_get(1).map_err(fail)?;
        let referenced: String = row.try_get(2).map_err(fail)?;
        foreign_keys.insert(column, ForeignKeyTarget::new(table, referenced));
    }
    Ok(foreign_keys)
}

/// カタログ行（`name, type`）をデコード
pub(crate) fn decode_catalog_rows(rows: &[AnyRow]) -> Result<Vec<RawCatalogRow>, DatabaseError> {
    rows.iter()
        .map(|row| {
            Ok(RawCatalogRow::new(
                row.try_get::<String, _>(0)?,
                row.try_get::<Option<String>, _>(1)?,
            ))
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|e| DatabaseError::catalog_query("Failed to decode catalog listing", e))
}

/// 大文字小文字を無視して重複を除く（初出順）
pub(crate) fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}
