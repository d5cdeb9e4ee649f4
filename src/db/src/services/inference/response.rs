// 推論応答の解析
//
// プロバイダーの生テキストからコードフェンスを除去し、寛容に AnalysisResult へ変換する。
// 欠落したフィールドは既定値、未知の相互作用は READ、未知のモードは IN。
// プロバイダーが fullScript を返しても無視する（呼び出し側が設定する）。

use super::InferenceRequest;
use crate::core::error::InferenceError;
use crate::core::lineage::{
    AnalysisResult, ColumnUsage, Interaction, ParameterMode, SqlParameter, TableDependency,
};
use crate::core::object::ObjectKind;
use serde::Deserialize;
use serde_json::Value;

/// 文字列1つ、または文字列の配列
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringList::One(value) => vec![value],
            StringList::Many(values) => values,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAnalysis {
    object_name: Option<String>,
    object_type: Option<String>,
    summary: Option<String>,
    parameters: Option<Vec<RawParameter>>,
    dependencies: Option<Vec<RawDependency>>,
    suggestions: Option<StringList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawParameter {
    name: Option<String>,
    data_type: Option<String>,
    mode: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDependency {
    table_name: Option<String>,
    interaction: Option<String>,
    columns_involved: Option<Vec<RawColumnUsage>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawColumnUsage {
    column_name: Option<String>,
    data_type: Option<String>,
    #[serde(alias = "usageType")]
    usage_kinds: Option<StringList>,
    description: Option<String>,
}

/// 先頭の ``` / ```json と末尾の ``` を取り除く
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        if let Some(body) = text.trim_end().strip_suffix("```") {
            text = body;
        }
    }
    text.trim()
}

/// 推論応答を AnalysisResult に変換
///
/// # Arguments
///
/// * `raw` - プロバイダーの生の応答テキスト
/// * `request` - 元のリクエスト（オブジェクト名/種別の補完に使用）
///
/// # Returns
///
/// `full_script` が空の解析結果。JSONとして解釈できなければ `MalformedResponse`
pub fn parse_inference_response(
    raw: &str,
    request: &InferenceRequest,
) -> Result<AnalysisResult, InferenceError> {
    let body = strip_code_fences(raw);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(first_error) => match outermost_object(body) {
            Some(object) => {
                serde_json::from_str(object).map_err(|e| malformed(e.to_string(), raw))?
            }
            None => return Err(malformed(first_error.to_string(), raw)),
        },
    };

    if !value.is_object() {
        return Err(malformed(
            format!("expected a JSON object, found {}", json_kind(&value)),
            raw,
        ));
    }
    let parsed: RawAnalysis =
        serde_json::from_value(value).map_err(|e| malformed(e.to_string(), raw))?;

    Ok(into_analysis(parsed, request))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// 前後に説明文が付いている場合に備え、最外の `{ ... }` を取り出す
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn malformed(error: String, raw: &str) -> InferenceError {
    const PREVIEW_CHARS: usize = 120;
    let preview: String = raw.chars().take(PREVIEW_CHARS).collect();
    InferenceError::MalformedResponse {
        message: format!("{} (response starts with: {:?})", error, preview),
    }
}

fn into_analysis(raw: RawAnalysis, request: &InferenceRequest) -> AnalysisResult {
    let object_name = raw
        .object_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| request.object_name.clone());
    let object_type = raw
        .object_type
        .and_then(|t| t.parse::<ObjectKind>().ok())
        .unwrap_or(request.object_kind);

    AnalysisResult {
        object_name,
        object_type,
        summary: raw.summary.unwrap_or_default(),
        parameters: raw
            .parameters
            .unwrap_or_default()
            .into_iter()
            .map(|p| SqlParameter {
                name: p.name.unwrap_or_default(),
                data_type: p.data_type.unwrap_or_default(),
                mode: p
                    .mode
                    .as_deref()
                    .map(ParameterMode::from_loose)
                    .unwrap_or_default(),
                description: p.description,
            })
            .collect(),
        dependencies: raw
            .dependencies
            .unwrap_or_default()
            .into_iter()
            .map(into_dependency)
            .collect(),
        suggestions: raw.suggestions.map(StringList::into_vec).unwrap_or_default(),
        full_script: String::new(),
    }
}

fn into_dependency(raw: RawDependency) -> TableDependency {
    TableDependency {
        table_name: raw.table_name.unwrap_or_default(),
        interaction: raw
            .interaction
            .as_deref()
            .map(Interaction::from_loose)
            .unwrap_or_default(),
        columns_involved: raw
            .columns_involved
            .unwrap_or_default()
            .into_iter()
            .map(|c| ColumnUsage {
                column_name: c.column_name.unwrap_or_default(),
                data_type: c.data_type.unwrap_or_default(),
                usage_kinds: dedupe_tags(c.usage_kinds.map(StringList::into_vec).unwrap_or_default()),
                description: c.description,
            })
            .collect(),
    }
}

/// 利用タグの重複を順序を保って除く
fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Engine;

    fn request() -> InferenceRequest {
        InferenceRequest::new(
            "v_sales_summary",
            ObjectKind::View,
            "SELECT 1",
            Some(Engine::MySQL),
        )
    }

    // =========================================================================
    // コードフェンス
    // =========================================================================

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON\n{}\n```  "), "{}");
    }

    #[test]
    fn test_strip_plain_fence() {
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_strip_no_fence() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    // =========================================================================
    // 解析
    // =========================================================================

    #[test]
    fn test_parse_full_response() {
        let raw = r#"```json
{
  "objectName": "v_sales_summary",
  "objectType": "VIEW",
  "summary": "Totals sold per product",
  "parameters": [],
  "dependencies": [
    {
      "tableName": "tbl_sales",
      "interaction": "READ",
      "columnsInvolved": [
        { "columnName": "quantity", "dataType": "INT", "usageType": ["SELECT", "SELECT", "AGGREGATE"], "description": "Summed" }
      ]
    }
  ],
  "suggestions": ["Index product_id"],
  "fullScript": "DROP TABLE everything"
}
```"#;

        let result = parse_inference_response(raw, &request()).unwrap();

        assert_eq!(result.object_name, "v_sales_summary");
        assert_eq!(result.object_type, ObjectKind::View);
        assert_eq!(result.summary, "Totals sold per product");
        assert_eq!(result.dependencies[0].table_name, "tbl_sales");
        assert_eq!(
            result.dependencies[0].columns_involved[0].usage_kinds,
            vec!["SELECT", "AGGREGATE"]
        );
        assert_eq!(result.suggestions, vec!["Index product_id"]);
        assert_eq!(result.full_script, "");
    }

    #[test]
    fn test_parse_lenient_defaults() {
        let raw = r#"{
  "dependencies": [
    { "tableName": "orders", "interaction": "MERGE", "columnsInvolved": null },
    { "tableName": "audit", "interaction": "INSERT" }
  ],
  "parameters": [ { "name": "p_id", "mode": "sideways" }, { "name": "p_out", "mode": "OUTPUT" } ],
  "suggestions": "Consider partitioning"
}"#;

        let result = parse_inference_response(raw, &request()).unwrap();

        assert_eq!(result.object_name, "v_sales_summary");
        assert_eq!(result.object_type, ObjectKind::View);
        assert_eq!(result.summary, "");
        assert_eq!(result.dependencies[0].interaction, Interaction::Read);
        assert!(result.dependencies[0].columns_involved.is_empty());
        assert_eq!(result.dependencies[1].interaction, Interaction::Write);
        assert_eq!(result.parameters[0].mode, ParameterMode::In);
        assert_eq!(result.parameters[1].mode, ParameterMode::Out);
        assert_eq!(result.suggestions, vec!["Consider partitioning"]);
    }

    #[test]
    fn test_parse_accepts_usage_kinds_key() {
        let raw = r#"{"dependencies":[{"tableName":"t","columnsInvolved":[{"columnName":"c","usageKinds":"WHERE"}]}]}"#;
        let result = parse_inference_response(raw, &request()).unwrap();
        assert_eq!(result.dependencies[0].columns_involved[0].usage_kinds, vec!["WHERE"]);
    }

    #[test]
    fn test_parse_unknown_object_type_falls_back() {
        let raw = r#"{"objectName": "", "objectType": "MATERIALIZED"}"#;
        let result = parse_inference_response(raw, &request()).unwrap();
        assert_eq!(result.object_name, "v_sales_summary");
        assert_eq!(result.object_type, ObjectKind::View);
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let raw = "Here is the analysis:\n{\"summary\": \"ok\"}\nLet me know!";
        let result = parse_inference_response(raw, &request()).unwrap();
        assert_eq!(result.summary, "ok");
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_inference_response("I could not analyze this.", &request()).unwrap_err();
        assert!(err.is_malformed_response());

        let err = parse_inference_response("```json\n{\"summary\": \n```", &request()).unwrap_err();
        assert!(err.is_malformed_response());
    }

    #[test]
    fn test_parse_rejects_top_level_array() {
        let err = parse_inference_response("[]", &request()).unwrap_err();
        assert!(err.is_malformed_response());
        assert!(err.to_string().contains("found an array"));

        let err = parse_inference_response("```json\n[\"oops\"]\n```", &request()).unwrap_err();
        assert!(err.is_malformed_response());
    }

    #[test]
    fn test_parse_rejects_scalar() {
        let err = parse_inference_response("\"just text\"", &request()).unwrap_err();
        assert!(err.to_string().contains("found a string"));
    }
}
