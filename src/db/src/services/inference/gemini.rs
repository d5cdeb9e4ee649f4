// Gemini 推論プロバイダー
//
// generateContent API を reqwest で呼び出し、候補のテキストを連結して返す。
// HTTP 429 または RESOURCE_EXHAUSTED はレート制限として区別する。

use super::{build_prompt, InferenceProvider, InferenceRequest};
use crate::core::config::InferenceConfig;
use crate::core::error::InferenceError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 公開APIのベースURL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ErrorBody {
    message: String,
    status: String,
}

/// Gemini プロバイダー
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    /// APIキーとモデル名から作成
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, InferenceError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(InferenceError::NotConfigured {
                message: "Gemini API key is empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InferenceError::Provider {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// 推論設定から作成（APIキーは `api_key_env` の環境変数から読む）
    pub fn from_config(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            InferenceError::NotConfigured {
                message: format!("Set the {} environment variable", config.api_key_env),
            }
        })?;
        Self::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

/// エラー応答を分類
fn classify_failure(status: StatusCode, body: &str) -> InferenceError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error)
        .unwrap_or_default();
    let message = if parsed.message.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, parsed.message)
    };

    if status == StatusCode::TOO_MANY_REQUESTS
        || parsed.status == RESOURCE_EXHAUSTED
        || body.contains(RESOURCE_EXHAUSTED)
    {
        InferenceError::RateLimited { message }
    } else {
        InferenceError::Provider { message }
    }
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn infer(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        debug!(model = %self.model, object = %request.object_name, "Requesting inference");

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Provider {
                message: format!("Request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| InferenceError::Provider {
            message: format!("Failed to read response body: {}", e.without_url()),
        })?;

        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| InferenceError::MalformedResponse {
                message: format!("Unexpected response envelope: {}", e),
            })?;

        let answer: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if answer.trim().is_empty() {
            return Err(InferenceError::MalformedResponse {
                message: "Model returned no text".to_string(),
            });
        }
        Ok(answer)
    }
}
