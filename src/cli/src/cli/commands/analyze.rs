// analyzeコマンドハンドラー
//
// 系譜レポートを作成します。
// - 接続モード: データベースから定義を取得し、推論結果をカタログと照合
// - スクリプトモード: ファイルの内容をそのまま推論に渡す（接続なし、照合なし）

use crate::cli::command_context::CommandContext;
use crate::cli::commands::details::format_dependencies;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::config::Engine;
use crate::core::lineage::AnalysisResult;
use crate::core::object::ObjectKind;
use crate::services::inference::InferenceProvider;
use crate::services::lineage_service::LineageService;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// スクリプトモードで名前が省略された場合の既定名
pub const DEFAULT_SCRIPT_NAME: &str = "Script";

/// analyzeコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeOutput {
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl CommandOutput for AnalyzeOutput {
    fn to_text(&self) -> String {
        format_analysis(&self.result)
    }
}

/// analyzeコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct AnalyzeCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// オブジェクト名（スクリプトモードでは省略可）
    pub name: Option<String>,
    /// オブジェクト種別
    pub kind: ObjectKind,
    /// 解析するスクリプトファイル
    pub script: Option<PathBuf>,
    /// スクリプトの方言ヒント
    pub engine: Option<Engine>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// analyzeコマンドハンドラー
#[derive(Debug, Default)]
pub struct AnalyzeCommandHandler {}

impl AnalyzeCommandHandler {
    /// 新しいAnalyzeCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// analyzeコマンドを実行
    pub async fn execute(&self, command: &AnalyzeCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let provider = context.inference_provider()?;
        self.execute_with_provider(command, &context, &provider)
            .await
    }

    /// 推論プロバイダーを指定してanalyzeコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - analyzeコマンドのパラメータ
    /// * `context` - 読み込み済みのコマンドコンテキスト
    /// * `provider` - 推論プロバイダー
    ///
    /// # Returns
    ///
    /// 成功時は系譜レポート、失敗時はエラーメッセージ
    pub async fn execute_with_provider(
        &self,
        command: &AnalyzeCommand,
        context: &CommandContext,
        provider: &dyn InferenceProvider,
    ) -> Result<String> {
        let result = match &command.script {
            Some(path) => self.analyze_script(command, path, provider).await?,
            None => self.analyze_object(command, context, provider).await?,
        };

        debug!(
            object = %result.object_name,
            dependencies = result.dependencies.len(),
            "Analysis completed"
        );
        render_output(&AnalyzeOutput { result }, &command.format)
    }

    async fn analyze_script(
        &self,
        command: &AnalyzeCommand,
        path: &Path,
        provider: &dyn InferenceProvider,
    ) -> Result<AnalysisResult> {
        let script = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script file: {:?}", path))?;
        if script.trim().is_empty() {
            return Err(anyhow!("Script file is empty: {:?}", path));
        }
        let name = command.name.as_deref().unwrap_or(DEFAULT_SCRIPT_NAME);

        LineageService::new()
            .analyze_script(name, command.kind, &script, command.engine, provider)
            .await
            .inspect_err(|e| {
                if e.is_rate_limited() {
                    warn!("Inference provider is rate limited");
                }
            })
            .with_context(|| format!("Failed to analyze script {:?}", path))
    }

    async fn analyze_object(
        &self,
        command: &AnalyzeCommand,
        context: &CommandContext,
        provider: &dyn InferenceProvider,
    ) -> Result<AnalysisResult> {
        let name = command
            .name
            .as_deref()
            .ok_or_else(|| anyhow!("Object name is required unless --script is given"))?;
        let service = context.connected_service(&command.env).await?;

        service
            .analyze_object(name, command.kind, provider)
            .await
            .inspect_err(|e| {
                if e.is_rate_limited() {
                    warn!("Inference provider is rate limited");
                }
            })
            .with_context(|| format!("Failed to analyze {}", name))
    }
}

/// 解析結果をテキスト整形
pub fn format_analysis(result: &AnalysisResult) -> String {
    let mut output = format!(
        "{}\n\n",
        format!("=== {} ({}) ===", result.object_name, result.object_type).bold()
    );

    if !result.summary.is_empty() {
        output.push_str(&format!("{}\n{}\n\n", "--- Summary ---".bold(), result.summary));
    }

    if !result.parameters.is_empty() {
        output.push_str(&format!("{}\n", "--- Parameters ---".bold()));
        for parameter in &result.parameters {
            output.push_str(&format!(
                "  {} {} {}",
                parameter.mode, parameter.name, parameter.data_type
            ));
            if let Some(description) = &parameter.description {
                output.push_str(&format!(" - {}", description));
            }
            output.push('\n');
        }
        output.push('\n');
    }

    output.push_str(&format_dependencies(&result.dependencies));

    if !result.suggestions.is_empty() {
        output.push_str(&format!("\n{}\n", "--- Suggestions ---".bold()));
        for suggestion in &result.suggestions {
            output.push_str(&format!("  - {}\n", suggestion.yellow()));
        }
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lineage::{ParameterMode, SqlParameter};

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            object_name: "sp_process_sale".to_string(),
            object_type: ObjectKind::Procedure,
            summary: "Registers a sale".to_string(),
            parameters: vec![SqlParameter {
                name: "p_product_id".to_string(),
                data_type: "INT".to_string(),
                mode: ParameterMode::In,
                description: None,
            }],
            dependencies: vec![],
            suggestions: vec!["Wrap in a transaction".to_string()],
            full_script: "CREATE PROCEDURE sp_process_sale ...".to_string(),
        }
    }

    #[test]
    fn test_format_analysis_sections() {
        colored::control::set_override(false);
        let text = format_analysis(&sample_result());

        assert!(text.starts_with("=== sp_process_sale (PROCEDURE) ==="));
        assert!(text.contains("--- Summary ---\nRegisters a sale"));
        assert!(text.contains("  IN p_product_id INT"));
        assert!(text.contains("  - Wrap in a transaction"));
    }

    #[test]
    fn test_analyze_json_keeps_full_script() {
        let output = AnalyzeOutput {
            result: sample_result(),
        };
        let json = render_output(&output, &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["fullScript"], "CREATE PROCEDURE sp_process_sale ...");
        assert_eq!(value["parameters"][0]["mode"], "IN");
    }
}
