// catalogコマンドハンドラー
//
// 接続先のテーブル、ビュー、ルーチン、トリガーを一覧表示します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::object::CatalogItem;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// catalogコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct CatalogOutput {
    pub environment: String,
    pub items: Vec<CatalogItem>,
}

impl CommandOutput for CatalogOutput {
    fn to_text(&self) -> String {
        format_catalog(&self.environment, &self.items)
    }
}

/// catalogコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct CatalogCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// catalogコマンドハンドラー
#[derive(Debug, Default)]
pub struct CatalogCommandHandler {}

impl CatalogCommandHandler {
    /// 新しいCatalogCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// catalogコマンドを実行
    pub async fn execute(&self, command: &CatalogCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let service = context.connected_service(&command.env).await?;

        let items = service
            .get_catalog()
            .await
            .with_context(|| "Failed to list database objects")?;
        debug!(count = items.len(), env = %command.env, "Loaded catalog");

        let output = CatalogOutput {
            environment: command.env.clone(),
            items,
        };
        render_output(&output, &command.format)
    }
}

/// カタログ一覧をテキスト整形
pub fn format_catalog(environment: &str, items: &[CatalogItem]) -> String {
    if items.is_empty() {
        return format!("No objects found in environment '{}'.", environment);
    }

    let width = items
        .iter()
        .map(|i| i.object_type.len())
        .max()
        .unwrap_or(0);

    let mut output = format!(
        "{}\n",
        format!("Objects in '{}' ({})", environment, items.len()).bold()
    );
    for item in items {
        output.push_str(&format!(
            "  {:<width$}  {}\n",
            item.object_type,
            item.name,
            width = width
        ));
    }
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Engine;

    #[test]
    fn test_format_catalog_aligns_types() {
        colored::control::set_override(false);
        let items = vec![
            CatalogItem::new("orders", Some("BASE TABLE"), Engine::MySQL),
            CatalogItem::new("sp_process_sale", Some("procedure"), Engine::MySQL),
        ];

        let text = format_catalog("development", &items);

        assert!(text.starts_with("Objects in 'development' (2)"));
        assert!(text.contains("  TABLE      orders"));
        assert!(text.contains("  PROCEDURE  sp_process_sale"));
    }

    #[test]
    fn test_format_catalog_empty() {
        assert_eq!(
            format_catalog("staging", &[]),
            "No objects found in environment 'staging'."
        );
    }

    #[test]
    fn test_catalog_json_output() {
        let output = CatalogOutput {
            environment: "development".to_string(),
            items: vec![CatalogItem::new("v_sales", Some("VIEW"), Engine::PostgreSQL)],
        };
        let json = render_output(&output, &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["items"][0]["type"], "VIEW");
        assert_eq!(value["items"][0]["engine"], "postgresql");
    }
}
