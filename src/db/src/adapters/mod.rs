// Adapters
// データベースへのアクセスを抽象化

pub mod connection_string;
pub mod database;
pub mod engine;
pub mod engine_adapter;
pub mod sql_quote;
