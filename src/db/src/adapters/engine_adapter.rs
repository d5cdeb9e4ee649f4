// エンジンアダプター
//
// データベースのシステムカタログからスキーマ情報を取得するための抽象化レイヤー。
// 各方言固有のカタログ問い合わせとDDL再構成を実装します。
// すべての呼び出しは接続を1本開き、成功/失敗にかかわらず閉じてから結果を返します。

use crate::adapters::engine::mysql::MySqlAdapter;
use crate::adapters::engine::postgres::PostgresAdapter;
use crate::adapters::engine::sqlserver::SqlServerAdapter;
use crate::core::best_effort::BestEffort;
use crate::core::config::{ConnectionConfig, Engine};
use crate::core::error::DatabaseError;
use crate::core::lineage::{format_data_type, ForeignKeyTarget};
use crate::core::object::ObjectKind;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// 定義が取得できなかった場合のDDLプレースホルダー
pub const NO_DEFINITION_FOUND: &str = "-- No definition found";

/// 生のカラム情報（DB固有フォーマット）
///
/// カタログから取得したカラム情報をそのまま保持する構造体。
/// schema_normalizer で ColumnDescriptor に変換されます。
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumnRow {
    /// カラム名
    pub name: String,
    /// データ型（DB固有の型文字列）
    pub data_type: String,
    /// NULL許可フラグ
    pub is_nullable: bool,
    /// デフォルト値
    pub default_value: Option<String>,
    /// 文字型の最大長
    pub char_max_length: Option<i64>,
    /// 数値型の精度
    pub numeric_precision: Option<i64>,
    /// 数値型のスケール
    pub numeric_scale: Option<i64>,
}

impl RawColumnRow {
    /// information_schema の IS_NULLABLE 値を解釈
    pub fn parse_nullable(value: &str) -> bool {
        value.eq_ignore_ascii_case("YES")
    }
}

/// 生のカタログ項目（テーブル/ルーチン/トリガー）
#[derive(Debug, Clone, PartialEq)]
pub struct RawCatalogRow {
    /// オブジェクト名
    pub name: String,
    /// カタログ上の種別（`BASE TABLE`, `VIEW`, `PROCEDURE`, ...）
    pub object_type: Option<String>,
}

impl RawCatalogRow {
    pub fn new(name: impl Into<String>, object_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            object_type,
        }
    }
}

/// エンジンアダプターインターフェース
///
/// 各データベース方言固有のカタログ問い合わせを抽象化します。
/// 接続時に一度だけ選択され、セッションの間トレイトオブジェクトとして保持されます。
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// 対象エンジン
    fn engine(&self) -> Engine;

    /// カラム情報を取得（カタログの序数順）
    async fn describe_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, DatabaseError>;

    /// 主キー構成カラムを取得
    async fn describe_primary_key(&self, table_name: &str)
        -> Result<HashSet<String>, DatabaseError>;

    /// 外部キー（カラム名 → 参照先）を取得
    async fn describe_foreign_keys(
        &self,
        table_name: &str,
    ) -> Result<HashMap<String, ForeignKeyTarget>, DatabaseError>;

    /// カタログ上の依存テーブルを取得
    ///
    /// テキスト走査の下に重ねる最適化なので、失敗は `BestEffort::Absorbed` として吸収します。
    async fn describe_catalog_dependencies(
        &self,
        object_name: &str,
        kind: ObjectKind,
    ) -> BestEffort<Vec<String>>;

    /// オブジェクトのDDLを取得
    ///
    /// テーブルはカラム情報から `CREATE TABLE` を合成し、
    /// ルーチンは格納された定義テキストをそのまま返します。
    async fn reconstruct_ddl(&self, object_name: &str, kind: ObjectKind)
        -> Result<String, DatabaseError>;

    /// カタログ一覧（テーブル、ルーチン、トリガー）を取得
    async fn list_catalog(&self) -> Result<Vec<RawCatalogRow>, DatabaseError>;
}

/// 接続設定のエンジンに応じたアダプターを作成
pub fn create_adapter(config: ConnectionConfig) -> Arc<dyn EngineAdapter> {
    match config.engine {
        Engine::PostgreSQL => Arc::new(PostgresAdapter::new(config)),
        Engine::MySQL => Arc::new(MySqlAdapter::new(config)),
        Engine::SqlServer => Arc::new(SqlServerAdapter::new(config)),
    }
}

/// カラム情報から近似的な CREATE TABLE 文を合成
///
/// テーブルにはネイティブなDDLが無いため、解析用のスクリプトとして組み立てます。
pub fn synthesize_create_table(table_name: &str, columns: &[RawColumnRow]) -> String {
    let body = columns
        .iter()
        .map(|c| {
            let data_type = format_data_type(
                &c.data_type,
                c.char_max_length,
                c.numeric_precision,
                c.numeric_scale,
            );
            let null_clause = if c.is_nullable { "" } else { " NOT NULL" };
            format!("  {} {}{}", c.name, data_type, null_clause)
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE {} (\n{}\n);", table_name, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, data_type: &str, nullable: bool, length: Option<i64>) -> RawColumnRow {
        RawColumnRow {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: nullable,
            default_value: None,
            char_max_length: length,
            numeric_precision: None,
            numeric_scale: None,
        }
    }

    #[test]
    fn test_create_adapter_matches_engine() {
        for engine in Engine::all() {
            let adapter = create_adapter(ConnectionConfig::new(engine, "app"));
            assert_eq!(adapter.engine(), engine);
        }
    }

    #[test]
    fn test_parse_nullable() {
        assert!(RawColumnRow::parse_nullable("YES"));
        assert!(RawColumnRow::parse_nullable("yes"));
        assert!(!RawColumnRow::parse_nullable("NO"));
    }

    #[test]
    fn test_synthesize_create_table() {
        let columns = vec![
            raw("id", "integer", false, None),
            raw("email", "varchar", true, Some(255)),
        ];

        let ddl = synthesize_create_table("users", &columns);

        assert_eq!(
            ddl,
            "CREATE TABLE users (\n  id integer NOT NULL,\n  email varchar(255)\n);"
        );
    }

    #[test]
    fn test_synthesize_create_table_without_columns() {
        let ddl = synthesize_create_table("ghost", &[]);
        assert_eq!(ddl, "CREATE TABLE ghost (\n\n);");
    }
}
