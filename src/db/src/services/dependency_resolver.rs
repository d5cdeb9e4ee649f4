// 依存関係解決サービス
//
// ルーチン/ビュー/トリガーの定義テキストから参照テーブルを特定し、
// 実カラム情報と突き合わせて TableDependency を組み立てる。
// 候補はカタログの依存情報とテキスト走査の和集合。失敗した候補は捨て、全体は失敗させない。

use crate::adapters::engine_adapter::EngineAdapter;
use crate::core::best_effort::BestEffort;
use crate::core::lineage::{
    ColumnDescriptor, ColumnUsage, Interaction, TableDependency, USAGE_IMPLICIT, USAGE_READ_WRITE,
};
use crate::core::object::ObjectKind;
use crate::services::schema_normalizer::introspect_table;
use futures::stream::{self, StreamExt};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// 同時に検索する候補テーブルの上限
///
/// 1件の検索で describe_* を3本並行に呼ぶため、同時接続数はこの3倍になる。
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// FROM / JOIN / UPDATE / INSERT INTO の直後の識別子
static TABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN|UPDATE|INSERT\s+INTO)\s+([A-Za-z0-9_]+)")
        .expect("table reference pattern is valid")
});

/// 候補テーブルの検索結果
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateLookup {
    /// 実在し、カラムを持つテーブル
    Resolved(TableDependency),
    /// 存在しない、カラムが無い、または問い合わせに失敗した
    Dropped { table: String, reason: String },
}

/// 定義テキストから参照テーブル名を抽出
///
/// オブジェクト自身の名前（大文字小文字を無視）は除外します。重複は除きません。
pub fn scan_table_references(source: &str, object_name: &str) -> Vec<String> {
    TABLE_REFERENCE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.eq_ignore_ascii_case(object_name))
        .collect()
}

/// カタログ結果と走査結果を統合
///
/// カタログ結果を先に、走査結果を後に並べ、大文字小文字を無視して初出順に重複を除く。
pub fn merge_candidates(
    catalog: Vec<String>,
    scanned: Vec<String>,
    object_name: &str,
) -> Vec<String> {
    let mut seen = HashSet::new();
    catalog
        .into_iter()
        .chain(scanned)
        .filter(|name| !name.eq_ignore_ascii_case(object_name))
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

/// 定義テキストに現れるカラムを分類
///
/// カラム名の部分一致（大文字小文字を無視）で判定する。
/// 1つでも一致すれば一致したカラムのみを `READ/WRITE`、
/// 1つも一致しなければ全カラムを `IMPLICIT`（`SELECT *` 相当）とする。
pub fn classify_columns(columns: &[ColumnDescriptor], source: &str) -> Vec<ColumnUsage> {
    let haystack = source.to_lowercase();
    let mentioned: Vec<&ColumnDescriptor> = columns
        .iter()
        .filter(|c| haystack.contains(&c.name.to_lowercase()))
        .collect();

    let (selected, tag): (Vec<&ColumnDescriptor>, &str) = if mentioned.is_empty() {
        (columns.iter().collect(), USAGE_IMPLICIT)
    } else {
        (mentioned, USAGE_READ_WRITE)
    };

    selected
        .into_iter()
        .map(|c| ColumnUsage {
            column_name: c.name.clone(),
            data_type: c.formatted_data_type(),
            usage_kinds: vec![tag.to_string()],
            description: c.key_tags(),
        })
        .collect()
}

/// 候補テーブルを1件検索
async fn lookup_candidate(adapter: &dyn EngineAdapter, table: &str, source: &str) -> CandidateLookup {
    match introspect_table(adapter, table).await {
        Ok(columns) if columns.is_empty() => CandidateLookup::Dropped {
            table: table.to_string(),
            reason: "no columns in catalog".to_string(),
        },
        Ok(columns) => CandidateLookup::Resolved(TableDependency {
            table_name: table.to_string(),
            interaction: Interaction::Read,
            columns_involved: classify_columns(&columns, source),
        }),
        Err(e) => CandidateLookup::Dropped {
            table: table.to_string(),
            reason: e.to_string(),
        },
    }
}

/// 依存テーブルを解決
///
/// 失敗しない。カタログの依存情報が取れなければテキスト走査のみで解決し、
/// 個々の候補の失敗はその候補を除外するだけで他には影響しない。
/// 検索は最大 `MAX_CONCURRENT_LOOKUPS` 件ずつ並行に行い、結果は候補の初出順に並ぶ。
///
/// # Arguments
///
/// * `adapter` - 接続中のエンジンアダプター
/// * `object_name` - 解析対象オブジェクト名（自己参照は除外）
/// * `kind` - 解析対象の種別
/// * `source` - オブジェクトの定義テキスト
pub async fn resolve_dependencies(
    adapter: &dyn EngineAdapter,
    object_name: &str,
    kind: ObjectKind,
    source: &str,
) -> Vec<TableDependency> {
    let catalog = match adapter.describe_catalog_dependencies(object_name, kind).await {
        BestEffort::Value(tables) => tables,
        BestEffort::Absorbed { reason } => {
            debug!(object = %object_name, reason = %reason, "Falling back to text scan only");
            Vec::new()
        }
    };
    let scanned = scan_table_references(source, object_name);
    let candidates = merge_candidates(catalog, scanned, object_name);

    debug!(object = %object_name, candidates = ?candidates, "Resolving dependency candidates");

    let lookups: Vec<CandidateLookup> = stream::iter(&candidates)
        .map(|table| lookup_candidate(adapter, table, source))
        .buffered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await;

    lookups
        .into_iter()
        .filter_map(|lookup| match lookup {
            CandidateLookup::Resolved(dependency) => Some(dependency),
            CandidateLookup::Dropped { table, reason } => {
                debug!(table = %table, reason = %reason, "Dropped dependency candidate");
                None
            }
        })
        .collect()
}
