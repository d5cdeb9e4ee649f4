// Services Layer
// 正規化、依存関係解決、照合、推論境界、セッションを束ねるサービス層

pub mod config_loader;
pub mod database_config_resolver;
pub mod dependency_resolver;
pub mod inference;
pub mod lineage_reconciler;
pub mod lineage_service;
pub mod schema_normalizer;
pub mod session;
