// 推論プロバイダー境界
//
// 定義テキストから要約・パラメータ・依存関係の推定を得る外部プロバイダーの抽象化。
// プロバイダーは生のテキストを返し、解析は response モジュールが行う。

pub mod gemini;
pub mod prompt;
pub mod response;

use crate::core::config::Engine;
use crate::core::error::InferenceError;
use crate::core::object::ObjectKind;
use async_trait::async_trait;

pub use prompt::build_prompt;
pub use response::parse_inference_response;

/// 推論リクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// 解析対象オブジェクト名
    pub object_name: String,
    /// 解析対象の種別
    pub object_kind: ObjectKind,
    /// 定義テキスト
    pub source_text: String,
    /// SQL方言のヒント
    pub engine_hint: Option<Engine>,
}

impl InferenceRequest {
    pub fn new(
        object_name: impl Into<String>,
        object_kind: ObjectKind,
        source_text: impl Into<String>,
        engine_hint: Option<Engine>,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            object_kind,
            source_text: source_text.into(),
            engine_hint,
        }
    }
}

/// 推論プロバイダー
///
/// 実装は外部サービスへの問い合わせのみを担い、応答は加工せずに返します。
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// プロバイダー名（ログ用）
    fn name(&self) -> &str;

    /// 推論を実行し、生の応答テキストを返す
    async fn infer(&self, request: &InferenceRequest) -> Result<String, InferenceError>;
}
