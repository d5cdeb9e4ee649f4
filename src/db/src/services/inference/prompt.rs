// 系譜解析プロンプト
//
// AnalysisResult と同じ形の JSON（fullScript を除く）を返すよう指示するプロンプトを組み立てる。

use super::InferenceRequest;

/// 方言ヒントが無い場合の表記
const GENERIC_DIALECT: &str = "generic SQL";

/// 推論プロンプトを組み立てる
pub fn build_prompt(request: &InferenceRequest) -> String {
    let dialect = request
        .engine_hint
        .map(|e| e.to_string())
        .unwrap_or_else(|| GENERIC_DIALECT.to_string());

    format!(
        r#"Act as a senior database architect. Analyze the following {dialect} definition.

OBJECT: {name} ({kind})
CODE:
---
{source}
---

TASK: Produce a detailed lineage analysis and return pure JSON.

1. Dependencies: identify EVERY table the code references.
2. Column detail: for each table, list the columns the code uses.
3. Summary: explain the business logic.

RULES:
- Return ONLY valid JSON.
- Do NOT put literal line breaks inside string values (use \n if needed).
- Do NOT include a "fullScript" field.

Expected JSON shape:
{{
  "objectName": "{name}",
  "objectType": "{kind}",
  "summary": "Concise functional description",
  "parameters": [
    {{ "name": "param_name", "dataType": "TYPE", "mode": "IN | OUT | INOUT", "description": "Short description" }}
  ],
  "dependencies": [
    {{
      "tableName": "table_name",
      "interaction": "READ | WRITE | BOTH",
      "columnsInvolved": [
        {{ "columnName": "column", "dataType": "TYPE", "usageKinds": ["SELECT", "WHERE"], "description": "Technical use" }}
      ]
    }}
  ],
  "suggestions": ["Suggestion 1"]
}}
"#,
        dialect = dialect,
        name = request.object_name,
        kind = request.object_kind,
        source = request.source_text,
    )
}
