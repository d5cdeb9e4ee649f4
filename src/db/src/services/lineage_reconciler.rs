// 系譜照合サービス
//
// 推論結果（要約、パラメータ、提案、説明文）とカタログの実データ（カラム、型）を統合する。
// 構造と型はカタログが正、説明文は推論結果が正。どちらの関数も失敗しない。

use crate::core::lineage::{
    AnalysisResult, ColumnDescriptor, ColumnUsage, Interaction, TableDependency,
    USAGE_DEFINITION,
};
use std::collections::HashMap;

/// 推論結果の説明文として採用する最小文字数（これを超える長さが必要）
const MIN_NARRATIVE_CHARS: usize = 2;

/// カラムの技術的な説明を組み立てる
///
/// `NULL|NOT NULL [DEFAULT <expr>] [(PK)] [(FK)]` を半角スペースで連結します。
///
/// # Examples
/// ```
/// use schemalens_db::core::lineage::ColumnDescriptor;
/// use schemalens_db::services::lineage_reconciler::technical_description;
/// let column = ColumnDescriptor {
///     name: "id".to_string(),
///     raw_data_type: "integer".to_string(),
///     length: None,
///     precision: None,
///     scale: None,
///     nullable: false,
///     default_expression: Some("0".to_string()),
///     is_primary_key: true,
///     is_foreign_key: false,
///     foreign_key_target: None,
/// };
/// assert_eq!(technical_description(&column), "NOT NULL DEFAULT 0 (PK)");
/// ```
pub fn technical_description(column: &ColumnDescriptor) -> String {
    let mut parts = vec![if column.nullable { "NULL" } else { "NOT NULL" }.to_string()];

    if let Some(default) = column
        .default_expression
        .as_deref()
        .filter(|d| !d.is_empty())
    {
        parts.push(format!("DEFAULT {}", default));
    }
    if column.is_primary_key {
        parts.push("(PK)".to_string());
    }
    if column.is_foreign_key {
        parts.push("(FK)".to_string());
    }

    parts.join(" ")
}

/// 推論結果の全依存からカラム名（小文字）→説明文のマップを作る
fn narrative_lookup(inferred: &AnalysisResult) -> HashMap<String, String> {
    let mut lookup = HashMap::new();
    for usage in inferred
        .dependencies
        .iter()
        .flat_map(|d| d.columns_involved.iter())
    {
        if let Some(description) = usage.description.as_deref().map(str::trim) {
            if description.chars().count() > MIN_NARRATIVE_CHARS {
                lookup.insert(usage.column_name.to_lowercase(), description.to_string());
            }
        }
    }
    lookup
}

/// テーブルの解析結果を照合
///
/// 依存はテーブル自身の1件のみとなり、全実カラムを `DEFINITION` として並べる。
/// 各カラムの説明は技術的な説明に推論結果の説明文を `. ` で連結したもの。
pub fn reconcile_table(
    inferred: AnalysisResult,
    table_name: &str,
    columns: &[ColumnDescriptor],
) -> AnalysisResult {
    let narratives = narrative_lookup(&inferred);

    let columns_involved = columns
        .iter()
        .map(|column| {
            let technical = technical_description(column);
            let description = match narratives.get(&column.name.to_lowercase()) {
                Some(narrative) => format!("{}. {}", technical, narrative),
                None => technical,
            };
            ColumnUsage {
                column_name: column.name.clone(),
                data_type: column.formatted_data_type(),
                usage_kinds: vec![USAGE_DEFINITION.to_string()],
                description: Some(description),
            }
        })
        .collect();

    AnalysisResult {
        dependencies: vec![TableDependency {
            table_name: table_name.to_string(),
            interaction: Interaction::Read,
            columns_involved,
        }],
        ..inferred
    }
}

/// ルーチンの解析結果を照合
///
/// 推論された依存のうち、実テーブル（大文字小文字を無視）に一致するものについて
/// 一致するカラムのデータ型だけを実際の型で上書きする。
/// 利用タグと説明はそのまま残し、未知のテーブル/カラムは変更しない。
pub fn reconcile_routine(
    mut inferred: AnalysisResult,
    ground_truth: &[TableDependency],
) -> AnalysisResult {
    let tables: HashMap<String, &TableDependency> = ground_truth
        .iter()
        .map(|d| (d.table_name.to_uppercase(), d))
        .collect();

    for dependency in &mut inferred.dependencies {
        let Some(real) = tables.get(&dependency.table_name.to_uppercase()) else {
            continue;
        };
        let real_types: HashMap<String, &str> = real
            .columns_involved
            .iter()
            .map(|c| (c.column_name.to_uppercase(), c.data_type.as_str()))
            .collect();

        for usage in &mut dependency.columns_involved {
            if let Some(data_type) = real_types.get(&usage.column_name.to_uppercase()) {
                usage.data_type = data_type.to_string();
            }
        }
    }

    inferred
}
