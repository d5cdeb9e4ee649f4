// ベストエフォート結果
//
// 失敗しても処理全体を止めない補助的な問い合わせ（カタログ依存関係など）の結果型。
// 「失敗は想定内で致命的ではない」ことを呼び出し側で明示する。

/// ベストエフォートな問い合わせの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    /// 取得成功
    Value(T),
    /// 失敗を吸収した（理由のみ保持）
    Absorbed {
        /// 吸収した失敗の理由
        reason: String,
    },
}

impl<T> BestEffort<T> {
    /// 失敗を吸収した結果を作成
    pub fn absorbed(reason: impl std::fmt::Display) -> Self {
        BestEffort::Absorbed {
            reason: reason.to_string(),
        }
    }

    /// 失敗を吸収したかどうか
    pub fn is_absorbed(&self) -> bool {
        matches!(self, BestEffort::Absorbed { .. })
    }

    /// 値を取り出す（吸収した場合はデフォルト値）
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            BestEffort::Value(value) => value,
            BestEffort::Absorbed { .. } => T::default(),
        }
    }

    /// Resultから変換（Errは吸収）
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => BestEffort::Value(value),
            Err(e) => Self::absorbed(e),
        }
    }
}
