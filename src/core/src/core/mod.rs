// Core Domain
// 接続設定、エラー分類、リネージ解析の値オブジェクト

pub mod best_effort;
pub mod config;
pub mod error;
pub mod lineage;
pub mod naming;
pub mod object;
