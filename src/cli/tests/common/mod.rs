// CLIテスト共通ヘルパー
//
// テスト全体で共有されるユーティリティ関数を集約する。
// テストファイルから `mod common;` で利用可能。

use anyhow::Result;
use async_trait::async_trait;
use schemalens::core::config::Config;
use schemalens::core::error::InferenceError;
use schemalens::services::inference::{InferenceProvider, InferenceRequest};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// development 環境を1つ持つ設定YAML
pub fn config_yaml(engine: &str, host: &str, port: u16, database: &str, user: &str) -> String {
    format!(
        r#"version: "1.0"
environments:
  development:
    engine: {engine}
    host: {host}
    port: {port}
    database: {database}
    user: {user}
    password: secret
    timeout: 5
inference:
  model: gemini-2.0-flash
  api_key_env: SCHEMALENS_TEST_GEMINI_KEY
"#
    )
}

/// テスト用のプロジェクトディレクトリを作成し、設定ファイルを書き出す
pub fn setup_test_project(config: &str) -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let project_path = temp_dir.path().to_path_buf();
    fs::write(project_path.join(Config::DEFAULT_CONFIG_PATH), config)?;
    Ok((temp_dir, project_path))
}

/// 固定の応答を返し、受け取ったリクエストを記録する推論プロバイダー
#[allow(dead_code)]
pub struct CannedProvider {
    response: String,
    pub requests: Mutex<Vec<InferenceRequest>>,
}

#[allow(dead_code)]
impl CannedProvider {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl InferenceProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn infer(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}
