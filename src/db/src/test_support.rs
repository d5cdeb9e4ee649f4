// テスト用インメモリアダプター
//
// 実データベースなしでサービス層を検証するための EngineAdapter 実装。

use crate::adapters::engine_adapter::{
    synthesize_create_table, EngineAdapter, RawCatalogRow, RawColumnRow, NO_DEFINITION_FOUND,
};
use crate::core::best_effort::BestEffort;
use crate::core::config::Engine;
use crate::core::error::DatabaseError;
use crate::core::lineage::ForeignKeyTarget;
use crate::core::object::ObjectKind;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// カラム行を作成
pub fn column(name: &str, data_type: &str, nullable: bool, length: Option<i64>) -> RawColumnRow {
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

/// 精度/スケール付きのカラム行を作成
pub fn numeric_column(name: &str, data_type: &str, precision: i64, scale: i64) -> RawColumnRow {
    RawColumnRow {
        numeric_precision: Some(precision),
        numeric_scale: Some(scale),
        ..column(name, data_type, false, None)
    }
}

/// describe_* 呼び出しの計測値（クローン間で共有）
#[derive(Debug, Default)]
pub struct CallStats {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    describe_columns: AtomicUsize,
}

impl CallStats {
    /// 同時に実行中だった describe_* 呼び出しの最大数
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// describe_columns の呼び出し回数
    pub fn describe_columns_calls(&self) -> usize {
        self.describe_columns.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a CallStats);

impl<'a> InFlight<'a> {
    fn enter(stats: &'a CallStats) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryAdapter {
    engine: Engine,
    columns: HashMap<String, Vec<RawColumnRow>>,
    primary_keys: HashMap<String, HashSet<String>>,
    foreign_keys: HashMap<String, HashMap<String, ForeignKeyTarget>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    catalog_dependencies: HashMap<String, Vec<String>>,
    definitions: HashMap<String, String>,
    catalog: Vec<RawCatalogRow>,
    stats: Arc<CallStats>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self {
            engine: Engine::PostgreSQL,
            columns: HashMap::new(),
            primary_keys: HashMap::new(),
            foreign_keys: HashMap::new(),
            failing: HashSet::new(),
            delays: HashMap::new(),
            catalog_dependencies: HashMap::new(),
            definitions: HashMap::new(),
            catalog: Vec::new(),
            stats: Arc::new(CallStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<CallStats> {
        self.stats.clone()
    }

    async fn delay_for(&self, table_name: &str) {
        if let Some(delay) = self.delays.get(table_name) {
            tokio::time::sleep(*delay).await;
        }
    }

    pub fn with_table(mut self, name: &str, columns: Vec<RawColumnRow>) -> Self {
        self.columns.insert(name.to_string(), columns);
        self.catalog
            .push(RawCatalogRow::new(name, Some("BASE TABLE".to_string())));
        self
    }

    pub fn with_primary_key(mut self, table: &str, columns: &[&str]) -> Self {
        self.primary_keys.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn with_foreign_key(
        mut self,
        table: &str,
        column: &str,
        target: &str,
        target_column: &str,
    ) -> Self {
        self.foreign_keys
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), ForeignKeyTarget::new(target, target_column));
        self
    }

    /// describe_columns が CatalogQuery で失敗するテーブル
    pub fn with_failing_table(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// describe_* の応答を遅延させる
    pub fn with_delay(mut self, table: &str, delay: Duration) -> Self {
        self.delays.insert(table.to_string(), delay);
        self
    }

    /// カタログ上の依存関係（未登録のオブジェクトは Absorbed）
    pub fn with_catalog_dependencies(mut self, object: &str, tables: &[&str]) -> Self {
        self.catalog_dependencies.insert(
            object.to_string(),
            tables.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_routine(mut self, name: &str, kind: &str, definition: &str) -> Self {
        self.definitions
            .insert(name.to_string(), definition.to_string());
        self.catalog
            .push(RawCatalogRow::new(name, Some(kind.to_string())));
        self
    }

    pub fn with_catalog_row(mut self, name: &str, kind: Option<&str>) -> Self {
        self.catalog
            .push(RawCatalogRow::new(name, kind.map(str::to_string)));
        self
    }
}

impl Default for InMemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineAdapter for InMemoryAdapter {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn describe_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, DatabaseError> {
        let _guard = InFlight::enter(&self.stats);
        self.stats.describe_columns.fetch_add(1, Ordering::SeqCst);
        self.delay_for(table_name).await;
        if self.failing.contains(table_name) {
            return Err(DatabaseError::catalog_query(
                format!("describe_columns({})", table_name),
                "permission denied",
            ));
        }
        Ok(self.columns.get(table_name).cloned().unwrap_or_default())
    }

    async fn describe_primary_key(
        &self,
        table_name: &str,
    ) -> Result<HashSet<String>, DatabaseError> {
        let _guard = InFlight::enter(&self.stats);
        self.delay_for(table_name).await;
        Ok(self.primary_keys.get(table_name).cloned().unwrap_or_default())
    }

    async fn describe_foreign_keys(
        &self,
        table_name: &str,
    ) -> Result<HashMap<String, ForeignKeyTarget>, DatabaseError> {
        let _guard = InFlight::enter(&self.stats);
        self.delay_for(table_name).await;
        Ok(self.foreign_keys.get(table_name).cloned().unwrap_or_default())
    }

    async fn describe_catalog_dependencies(
        &self,
        object_name: &str,
        _kind: ObjectKind,
    ) -> BestEffort<Vec<String>> {
        match self.catalog_dependencies.get(object_name) {
            Some(tables) => BestEffort::Value(tables.clone()),
            None => BestEffort::absorbed("catalog usage view not available"),
        }
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
        Ok(self
            .definitions
            .get(object_name)
            .cloned()
            .unwrap_or_else(|| NO_DEFINITION_FOUND.to_string()))
    }

    async fn list_catalog(&self) -> Result<Vec<RawCatalogRow>, DatabaseError> {
        Ok(self.catalog.clone())
    }
}
