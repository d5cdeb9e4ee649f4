// リネージ値オブジェクト
//
// カタログ由来の正規化カラム記述子と、解析結果（依存テーブル、カラム利用、パラメータ）の
// エンジン非依存な表現。すべてリクエスト単位で生成され、キャッシュされない。

use crate::core::object::ObjectKind;
use serde::{Deserialize, Serialize};

/// 明示的に参照されたカラムの利用タグ（操作種別は区別しない）
pub const USAGE_READ_WRITE: &str = "READ/WRITE";

/// ソース中で列挙されていないカラム（`SELECT *` など）の利用タグ
pub const USAGE_IMPLICIT: &str = "IMPLICIT";

/// テーブル定義そのもののカラムの利用タグ
pub const USAGE_DEFINITION: &str = "DEFINITION";

/// データ型を長さ/精度の接尾辞付きで整形
///
/// 優先順位は 長さ → 精度+スケール（スケールが0以外）→ 精度 → 型名のみ。
/// 値が0の場合は未設定として扱う。
pub fn format_data_type(
    data_type: &str,
    length: Option<i64>,
    precision: Option<i64>,
    scale: Option<i64>,
) -> String {
    match (length, precision, scale) {
        (Some(length), _, _) if length != 0 => format!("{}({})", data_type, length),
        (_, Some(precision), Some(scale)) if precision != 0 && scale != 0 => {
            format!("{}({},{})", data_type, precision, scale)
        }
        (_, Some(precision), _) if precision != 0 => format!("{}({})", data_type, precision),
        _ => data_type.to_string(),
    }
}

/// 外部キーの参照先
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    /// 参照先テーブル
    pub table: String,
    /// 参照先カラム
    pub column: String,
}

impl ForeignKeyTarget {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// 正規化済みカラム記述子
///
/// `is_foreign_key` は `foreign_key_target` が存在する場合に限り true。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// カラム名（テーブル内で一意）
    pub name: String,
    /// カタログ上のデータ型
    pub raw_data_type: String,
    /// 文字型の最大長
    pub length: Option<i64>,
    /// 数値型の精度
    pub precision: Option<i64>,
    /// 数値型のスケール
    pub scale: Option<i64>,
    /// NULL許可フラグ
    pub nullable: bool,
    /// デフォルト式
    pub default_expression: Option<String>,
    /// 主キー構成カラムか
    pub is_primary_key: bool,
    /// 外部キー構成カラムか
    pub is_foreign_key: bool,
    /// 外部キーの参照先
    pub foreign_key_target: Option<ForeignKeyTarget>,
}

impl ColumnDescriptor {
    /// 長さ/精度の接尾辞付きでデータ型を整形
    ///
    /// 長さがあれば `(length)`、精度とゼロ以外のスケールがあれば `(precision,scale)`、
    /// 精度のみなら `(precision)`、どれも無ければ型名のみ。
    ///
    /// # Examples
    /// ```
    /// use schemalens_core::core::lineage::ColumnDescriptor;
    /// let column = ColumnDescriptor {
    ///     name: "amount".to_string(),
    ///     raw_data_type: "numeric".to_string(),
    ///     length: None,
    ///     precision: Some(10),
    ///     scale: Some(2),
    ///     nullable: false,
    ///     default_expression: None,
    ///     is_primary_key: false,
    ///     is_foreign_key: false,
    ///     foreign_key_target: None,
    /// };
    /// assert_eq!(column.formatted_data_type(), "numeric(10,2)");
    /// ```
    pub fn formatted_data_type(&self) -> String {
        format_data_type(&self.raw_data_type, self.length, self.precision, self.scale)
    }

    /// キー種別タグ（"PK", "FK", "PK FK"）。どちらでもなければNone
    pub fn key_tags(&self) -> Option<String> {
        let mut tags = Vec::new();
        if self.is_primary_key {
            tags.push("PK");
        }
        if self.is_foreign_key {
            tags.push("FK");
        }

        if tags.is_empty() {
            None
        } else {
            Some(tags.join(" "))
        }
    }
}

/// テーブルとの相互作用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Interaction {
    #[default]
    Read,
    Write,
    Both,
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interaction::Read => write!(f, "READ"),
            Interaction::Write => write!(f, "WRITE"),
            Interaction::Both => write!(f, "BOTH"),
        }
    }
}

impl Interaction {
    /// 推論結果の自由記述から解釈（不明な値は READ）
    pub fn from_loose(value: &str) -> Self {
        let upper = value.trim().to_ascii_uppercase();
        let reads = upper.contains("READ") || upper.contains("SELECT");
        let writes = upper.contains("WRITE")
            || upper.contains("INSERT")
            || upper.contains("UPDATE")
            || upper.contains("DELETE");

        match (upper.as_str(), reads, writes) {
            ("BOTH", _, _) | (_, true, true) => Interaction::Both,
            (_, false, true) => Interaction::Write,
            _ => Interaction::Read,
        }
    }
}

/// カラムの利用状況
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnUsage {
    /// カラム名
    pub column_name: String,
    /// 整形済みデータ型（例: `varchar(255)`）
    pub data_type: String,
    /// 利用タグ（順序付き、重複なし）
    #[serde(default)]
    pub usage_kinds: Vec<String>,
    /// 説明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 依存テーブル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDependency {
    /// テーブル名
    pub table_name: String,
    /// 相互作用
    pub interaction: Interaction,
    /// 関与するカラム（順序付き）
    #[serde(default)]
    pub columns_involved: Vec<ColumnUsage>,
}

/// パラメータの入出力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParameterMode {
    #[default]
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "INOUT")]
    InOut,
}

impl std::fmt::Display for ParameterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterMode::In => write!(f, "IN"),
            ParameterMode::Out => write!(f, "OUT"),
            ParameterMode::InOut => write!(f, "INOUT"),
        }
    }
}

impl ParameterMode {
    /// 推論結果の自由記述から解釈（不明な値は IN）
    pub fn from_loose(value: &str) -> Self {
        let compact: String = value
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();

        match compact.as_str() {
            "OUT" | "OUTPUT" => ParameterMode::Out,
            "INOUT" => ParameterMode::InOut,
            _ => ParameterMode::In,
        }
    }
}

/// ルーチンのパラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlParameter {
    pub name: String,
    pub data_type: String,
    pub mode: ParameterMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 照合済みの解析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// オブジェクト名
    pub object_name: String,
    /// オブジェクト種別
    pub object_type: ObjectKind,
    /// 機能の要約
    pub summary: String,
    /// パラメータ（順序付き）
    #[serde(default)]
    pub parameters: Vec<SqlParameter>,
    /// 依存テーブル（順序付き）
    #[serde(default)]
    pub dependencies: Vec<TableDependency>,
    /// 改善提案
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// 解析したソーステキスト（呼び出し側が必ず設定する）
    #[serde(default)]
    pub full_script: String,
}
