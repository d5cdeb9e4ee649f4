// 系譜解析サービス
//
// 接続、オブジェクト詳細、カタログ一覧、解析（自動/手動）の各操作を提供する。
// 処理の流れ: セッション確認 → アダプター問い合わせ → 正規化 →
// （テーブル以外）依存関係解決 → 推論結果との照合 → 応答。

use crate::adapters::engine_adapter::{create_adapter, EngineAdapter};
use crate::core::config::{ConnectionConfig, Engine};
use crate::core::error::{AnalysisError, DatabaseError};
use crate::core::lineage::{AnalysisResult, Interaction, TableDependency};
use crate::core::object::{CatalogItem, ObjectAnalysis, ObjectDetails, ObjectKind};
use crate::services::dependency_resolver::resolve_dependencies;
use crate::services::inference::{parse_inference_response, InferenceProvider, InferenceRequest};
use crate::services::lineage_reconciler::{reconcile_routine, reconcile_table};
use crate::services::schema_normalizer::snapshot_table;
use crate::services::session::{ActiveConnection, ConnectRequest, Session};
use std::sync::Arc;
use tracing::{debug, info};

/// 接続設定からアダプターを作る関数
pub type AdapterFactory = Box<dyn Fn(ConnectionConfig) -> Arc<dyn EngineAdapter> + Send + Sync>;

/// 系譜解析サービス
pub struct LineageService {
    session: Session,
    adapter_factory: AdapterFactory,
}

impl Default for LineageService {
    fn default() -> Self {
        Self::new()
    }
}

impl LineageService {
    /// エンジンごとの標準アダプターを使うサービスを作成
    pub fn new() -> Self {
        Self::with_adapter_factory(Box::new(create_adapter))
    }

    /// アダプターの生成方法を差し替えて作成
    pub fn with_adapter_factory(adapter_factory: AdapterFactory) -> Self {
        Self {
            session: Session::new(),
            adapter_factory,
        }
    }

    /// 接続要求を受け付け、セッションを置き換える
    ///
    /// 接続確認は行いません。失敗は最初の問い合わせで表面化します。
    pub async fn connect(&self, request: ConnectRequest) -> Result<(), DatabaseError> {
        let config = request.into_config()?;
        self.connect_with_config(config).await;
        Ok(())
    }

    /// 検証済みの接続設定でセッションを置き換える
    pub async fn connect_with_config(&self, config: ConnectionConfig) {
        info!(
            engine = %config.engine,
            host = %config.host,
            database = %config.database,
            "Connection registered"
        );
        let adapter = (self.adapter_factory)(config.clone());
        self.session
            .replace(ActiveConnection::new(config, adapter))
            .await;
    }

    /// セッションを破棄する
    pub async fn disconnect(&self) {
        self.session.clear().await;
        info!("Connection cleared");
    }

    /// 接続中かどうか
    pub async fn is_connected(&self) -> bool {
        self.session.current().await.is_some()
    }

    /// オブジェクトのDDLとカタログ由来の解析を取得
    ///
    /// テーブルは実カラムと自己参照のプレースホルダー依存（カラム無し）、
    /// それ以外は解決済みの依存テーブルを返します。
    pub async fn get_object_details(
        &self,
        name: &str,
        kind: ObjectKind,
    ) -> Result<ObjectDetails, DatabaseError> {
        let connection = self.session.require().await?;
        object_details(connection.adapter(), name, kind).await
    }

    /// カタログ一覧（テーブル、ルーチン、トリガー）を取得
    ///
    /// 未接続の場合はエラーではなく空の一覧を返します。
    pub async fn get_catalog(&self) -> Result<Vec<CatalogItem>, DatabaseError> {
        let Some(connection) = self.session.current().await else {
            debug!("Catalog requested without a connection");
            return Ok(Vec::new());
        };

        let engine = connection.engine();
        let rows = connection.adapter().list_catalog().await?;
        Ok(rows
            .into_iter()
            .map(|row| CatalogItem::new(row.name, row.object_type.as_deref(), engine))
            .collect())
    }

    /// 接続中のオブジェクトを解析（DDL取得 → 推論 → 照合）
    pub async fn analyze_object(
        &self,
        name: &str,
        kind: ObjectKind,
        provider: &dyn InferenceProvider,
    ) -> Result<AnalysisResult, AnalysisError> {
        let connection = self.session.require().await?;
        let details = object_details(connection.adapter(), name, kind).await?;

        let request = InferenceRequest::new(name, kind, details.ddl.clone(), Some(connection.engine()));
        let inferred = infer(provider, &request).await?;

        let mut result = if kind.is_table() {
            let columns = details.analysis.columns.unwrap_or_default();
            reconcile_table(inferred, name, &columns)
        } else {
            reconcile_routine(inferred, &details.analysis.dependencies)
        };
        result.full_script = details.ddl;

        Ok(result)
    }

    /// 貼り付けられたスクリプトを解析（接続不要、照合なし）
    pub async fn analyze_script(
        &self,
        name: &str,
        kind: ObjectKind,
        script: &str,
        engine_hint: Option<Engine>,
        provider: &dyn InferenceProvider,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request = InferenceRequest::new(name, kind, script, engine_hint);
        let mut result = infer(provider, &request).await?;
        result.full_script = script.to_string();
        Ok(result)
    }
}

async fn object_details(
    adapter: &dyn EngineAdapter,
    name: &str,
    kind: ObjectKind,
) -> Result<ObjectDetails, DatabaseError> {
    if kind.is_table() {
        let snapshot = snapshot_table(adapter, name).await?;
        return Ok(ObjectDetails {
            ddl: snapshot.ddl,
            analysis: ObjectAnalysis {
                columns: Some(snapshot.columns),
                dependencies: vec![TableDependency {
                    table_name: name.to_string(),
                    interaction: Interaction::Read,
                    columns_involved: Vec::new(),
                }],
            },
        });
    }

    let ddl = adapter.reconstruct_ddl(name, kind).await?;
    let analysis = ObjectAnalysis {
        columns: None,
        dependencies: resolve_dependencies(adapter, name, kind, &ddl).await,
    };

    Ok(ObjectDetails { ddl, analysis })
}

async fn infer(
    provider: &dyn InferenceProvider,
    request: &InferenceRequest,
) -> Result<AnalysisResult, AnalysisError> {
    info!(
        provider = %provider.name(),
        object = %request.object_name,
        kind = %request.object_kind,
        "Running inference"
    );
    let raw = provider.infer(request).await?;
    Ok(parse_inference_response(&raw, request)?)
}
