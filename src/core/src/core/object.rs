// スキーマオブジェクト
//
// 解析対象オブジェクトの種別、カタログ一覧の項目、オブジェクト詳細の応答モデル。

use crate::core::config::Engine;
use crate::core::lineage::{ColumnDescriptor, TableDependency};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// オブジェクト種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Function,
    Trigger,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Table => write!(f, "TABLE"),
            ObjectKind::View => write!(f, "VIEW"),
            ObjectKind::Procedure => write!(f, "PROCEDURE"),
            ObjectKind::Function => write!(f, "FUNCTION"),
            ObjectKind::Trigger => write!(f, "TRIGGER"),
        }
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TABLE" | "BASE TABLE" => Ok(ObjectKind::Table),
            "VIEW" => Ok(ObjectKind::View),
            "PROCEDURE" => Ok(ObjectKind::Procedure),
            "FUNCTION" => Ok(ObjectKind::Function),
            "TRIGGER" => Ok(ObjectKind::Trigger),
            other => Err(format!(
                "Unknown object type: {}. Expected one of: TABLE, VIEW, PROCEDURE, FUNCTION, TRIGGER",
                other
            )),
        }
    }
}

impl ObjectKind {
    /// テーブルかどうか
    pub fn is_table(&self) -> bool {
        matches!(self, ObjectKind::Table)
    }
}

/// カタログ一覧の項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// オブジェクト名
    pub name: String,
    /// 種別タグ（大文字化済み、BASE TABLE は TABLE に正規化）
    #[serde(rename = "type")]
    pub object_type: String,
    /// エンジン
    pub engine: Engine,
}

impl CatalogItem {
    /// カタログの生の種別タグから項目を作成
    pub fn new(name: impl Into<String>, raw_type: Option<&str>, engine: Engine) -> Self {
        Self {
            name: name.into(),
            object_type: normalize_catalog_type(raw_type),
            engine,
        }
    }
}

/// カタログの種別タグを正規化
///
/// 大文字化し、`BASE TABLE` を `TABLE` に置き換えます。タグが無い場合は `UNKNOWN`。
pub fn normalize_catalog_type(raw_type: Option<&str>) -> String {
    match raw_type.map(|t| t.trim().to_uppercase()) {
        Some(t) if t == "BASE TABLE" => "TABLE".to_string(),
        Some(t) if !t.is_empty() => t,
        _ => "UNKNOWN".to_string(),
    }
}

/// オブジェクト詳細の解析部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAnalysis {
    /// テーブルの場合のみ、実カラム
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnDescriptor>>,
    /// 依存テーブル
    pub dependencies: Vec<TableDependency>,
}

/// オブジェクト詳細（DDL + カタログ由来の解析）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetails {
    /// オブジェクトの定義テキスト
    pub ddl: String,
    /// カタログ由来の解析結果
    pub analysis: ObjectAnalysis,
}
