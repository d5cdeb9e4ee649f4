// Schemalens コアライブラリ
//
// I/Oを持たない純粋なドメインモデル（設定、エラー、リネージ値オブジェクト）を提供する。

pub mod core;
