// detailsコマンドハンドラー
//
// オブジェクトの定義テキストと、カタログから解決した依存テーブルを表示します。
// テーブルは実カラム、それ以外は定義が参照するテーブルとそのカラムを表示します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::lineage::{ColumnDescriptor, TableDependency};
use crate::core::object::{ObjectDetails, ObjectKind};
use crate::services::lineage_reconciler::technical_description;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// detailsコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsOutput {
    pub object_name: String,
    pub object_type: ObjectKind,
    #[serde(flatten)]
    pub details: ObjectDetails,
}

impl CommandOutput for DetailsOutput {
    fn to_text(&self) -> String {
        let mut output = format!(
            "{}\n\n",
            format!("=== {} ({}) ===", self.object_name, self.object_type).bold()
        );
        output.push_str(self.details.ddl.trim_end());
        output.push_str("\n\n");

        if let Some(columns) = &self.details.analysis.columns {
            output.push_str(&format_columns(columns));
        } else {
            output.push_str(&format_dependencies(&self.details.analysis.dependencies));
        }
        output.trim_end().to_string()
    }
}

/// detailsコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DetailsCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// オブジェクト名
    pub name: String,
    /// オブジェクト種別
    pub kind: ObjectKind,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// detailsコマンドハンドラー
#[derive(Debug, Default)]
pub struct DetailsCommandHandler {}

impl DetailsCommandHandler {
    /// 新しいDetailsCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// detailsコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - detailsコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は定義と依存関係の表示、失敗時はエラーメッセージ
    pub async fn execute(&self, command: &DetailsCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let service = context.connected_service(&command.env).await?;

        let details = service
            .get_object_details(&command.name, command.kind)
            .await
            .with_context(|| format!("Failed to load details of {}", command.name))?;
        debug!(
            object = %command.name,
            dependencies = details.analysis.dependencies.len(),
            "Loaded object details"
        );

        let output = DetailsOutput {
            object_name: command.name.clone(),
            object_type: command.kind,
            details,
        };
        render_output(&output, &command.format)
    }
}

/// テーブルのカラム一覧をテキスト整形
pub fn format_columns(columns: &[ColumnDescriptor]) -> String {
    let mut output = format!("{}\n", "--- Columns ---".bold());
    for column in columns {
        output.push_str(&format!(
            "  {} {} {}",
            column.name,
            column.formatted_data_type(),
            technical_description(column)
        ));
        if let Some(target) = &column.foreign_key_target {
            output.push_str(&format!(" -> {}.{}", target.table, target.column));
        }
        output.push('\n');
    }
    output
}

/// 依存テーブルをテキスト整形
pub fn format_dependencies(dependencies: &[TableDependency]) -> String {
    let mut output = format!("{}\n", "--- Dependencies ---".bold());
    if dependencies.is_empty() {
        output.push_str("  (none)\n");
        return output;
    }

    for dependency in dependencies {
        output.push_str(&format!(
            "  {} [{}]\n",
            dependency.table_name.cyan(),
            dependency.interaction
        ));
        for usage in &dependency.columns_involved {
            output.push_str(&format!(
                "    {} {} {}",
                usage.column_name,
                usage.data_type,
                usage.usage_kinds.join(", ")
            ));
            if let Some(description) = &usage.description {
                output.push_str(&format!(" - {}", description));
            }
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lineage::{ColumnUsage, ForeignKeyTarget, Interaction};
    use crate::core::object::ObjectAnalysis;

    fn customer_id() -> ColumnDescriptor {
        ColumnDescriptor {
            name: "customer_id".to_string(),
            raw_data_type: "int".to_string(),
            length: None,
            precision: None,
            scale: None,
            nullable: false,
            default_expression: None,
            is_primary_key: false,
            is_foreign_key: true,
            foreign_key_target: Some(ForeignKeyTarget::new("customers", "id")),
        }
    }

    #[test]
    fn test_format_columns_shows_fk_target() {
        colored::control::set_override(false);
        let text = format_columns(&[customer_id()]);
        assert!(text.contains("  customer_id int NOT NULL (FK) -> customers.id"));
    }

    #[test]
    fn test_format_dependencies() {
        colored::control::set_override(false);
        let dependencies = vec![TableDependency {
            table_name: "tbl_sales".to_string(),
            interaction: Interaction::Read,
            columns_involved: vec![ColumnUsage {
                column_name: "quantity".to_string(),
                data_type: "int".to_string(),
                usage_kinds: vec!["READ/WRITE".to_string()],
                description: None,
            }],
        }];

        let text = format_dependencies(&dependencies);

        assert!(text.contains("  tbl_sales [READ]"));
        assert!(text.contains("    quantity int READ/WRITE"));
        assert!(format_dependencies(&[]).contains("(none)"));
    }

    #[test]
    fn test_details_json_is_flattened() {
        let output = DetailsOutput {
            object_name: "v_sales".to_string(),
            object_type: ObjectKind::View,
            details: ObjectDetails {
                ddl: "CREATE VIEW v_sales AS SELECT 1".to_string(),
                analysis: ObjectAnalysis {
                    columns: None,
                    dependencies: vec![],
                },
            },
        };

        let json = render_output(&output, &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["objectName"], "v_sales");
        assert_eq!(value["objectType"], "VIEW");
        assert_eq!(value["ddl"], "CREATE VIEW v_sales AS SELECT 1");
        assert!(value["analysis"]["columns"].is_null());
    }
}
