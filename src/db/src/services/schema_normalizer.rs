// スキーマ正規化サービス
//
// カタログの生のカラム行と主キー/外部キー情報を ColumnDescriptor に変換する。
// 外部キーフラグは参照先が存在する場合にのみ立つ。

use crate::adapters::engine_adapter::{synthesize_create_table, EngineAdapter, RawColumnRow};
use crate::core::error::DatabaseError;
use crate::core::lineage::{ColumnDescriptor, ForeignKeyTarget};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 生のカラム行を正規化
///
/// 入力順を保持し、主キー/外部キーの判定はカラム名の完全一致（大文字小文字を区別）で行う。
///
/// # Arguments
///
/// * `raw` - カタログから取得したカラム行（序数順）
/// * `primary_key` - 主キー構成カラム名
/// * `foreign_keys` - カラム名から参照先へのマップ
pub fn normalize_columns(
    raw: Vec<RawColumnRow>,
    primary_key: &HashSet<String>,
    foreign_keys: &HashMap<String, ForeignKeyTarget>,
) -> Vec<ColumnDescriptor> {
    raw.into_iter()
        .map(|row| {
            let foreign_key_target = foreign_keys.get(&row.name).cloned();
            ColumnDescriptor {
                is_primary_key: primary_key.contains(&row.name),
                is_foreign_key: foreign_key_target.is_some(),
                foreign_key_target,
                raw_data_type: row.data_type,
                length: row.char_max_length,
                precision: row.numeric_precision,
                scale: row.numeric_scale,
                nullable: row.is_nullable,
                default_expression: row.default_value,
                name: row.name,
            }
        })
        .collect()
}

type TableRows = (
    Vec<RawColumnRow>,
    HashSet<String>,
    HashMap<String, ForeignKeyTarget>,
);

async fn fetch_table_rows(
    adapter: &dyn EngineAdapter,
    table_name: &str,
) -> Result<TableRows, DatabaseError> {
    let (raw, primary_key, foreign_keys) = futures::try_join!(
        adapter.describe_columns(table_name),
        adapter.describe_primary_key(table_name),
        adapter.describe_foreign_keys(table_name),
    )?;

    debug!(
        table = %table_name,
        columns = raw.len(),
        primary_key = primary_key.len(),
        foreign_keys = foreign_keys.len(),
        "Introspected table"
    );

    Ok((raw, primary_key, foreign_keys))
}

/// テーブルのカラム、主キー、外部キーを取得して正規化
///
/// 3つの問い合わせは並行に実行し、いずれかが失敗した場合はそのエラーを返す。
pub async fn introspect_table(
    adapter: &dyn EngineAdapter,
    table_name: &str,
) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
    let (raw, primary_key, foreign_keys) = fetch_table_rows(adapter, table_name).await?;
    Ok(normalize_columns(raw, &primary_key, &foreign_keys))
}

/// 同じカラム行から組み立てた DDL と正規化済みカラム
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub ddl: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// テーブルの DDL とカラムを1回の取得で組み立てる
pub async fn snapshot_table(
    adapter: &dyn EngineAdapter,
    table_name: &str,
) -> Result<TableSnapshot, DatabaseError> {
    let (raw, primary_key, foreign_keys) = fetch_table_rows(adapter, table_name).await?;
    let ddl = synthesize_create_table(table_name, &raw);
    Ok(TableSnapshot {
        ddl,
        columns: normalize_columns(raw, &primary_key, &foreign_keys),
    })
}
