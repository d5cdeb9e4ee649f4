// Schemalensライブラリのエントリーポイント
//
// CLI層と、テストから参照しやすいよう各crateを再公開する。

pub mod cli;

pub use schemalens_core::core;
pub use schemalens_db::{adapters, services};
