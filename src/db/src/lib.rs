// Schemalens データベースライブラリ
//
// エンジンアダプター（I/O）と、正規化・依存関係解決・照合・推論境界のサービス層。

pub mod adapters;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use schemalens_core::core;
