//! Response Parsing Module
//!
//! Parses the model's JSON into raw records and normalizes them into
//! requirement items.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::client::AiError;
use crate::models::{RequirementItem, UNNAMED_REGION};

/// One record as returned by the model, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequirement {
    pub region: Option<String>,
    #[serde(alias = "function_name")]
    pub function_name: Option<String>,
    pub description: Option<String>,
    pub interaction: Option<String>,
    pub validation: Option<String>,
    pub scope: Option<String>,
}

impl RawRequirement {
    /// Converts into an item with a fresh ID; absent fields become empty
    /// strings and a blank region becomes the unnamed region
    pub fn into_item(self) -> RequirementItem {
        let region = self
            .region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| UNNAMED_REGION.to_string());

        RequirementItem {
            id: Uuid::new_v4(),
            region,
            function_name: self.function_name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            interaction: self.interaction.unwrap_or_default(),
            validation: self.validation.unwrap_or_default(),
            scope: self.scope.unwrap_or_default(),
        }
    }
}

/// Either a bare array or an object wrapping it under `items`
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordList {
    Bare(Vec<RawRequirement>),
    Wrapped { items: Vec<RawRequirement> },
}

/// Extract JSON from a response that may contain markdown code blocks
fn extract_json(response: &str) -> &str {
    // Look for JSON in markdown code block
    if let Some(start) = response.find("```json") {
        let json_start = start + 7;
        if let Some(end) = response[json_start..].find("```") {
            return response[json_start..json_start + end].trim();
        }
    }

    // Look for generic code block
    if let Some(start) = response.find("```") {
        let code_start = start + 3;
        let json_start = match response[code_start..].find('\n') {
            Some(newline) => code_start + newline + 1,
            None => code_start,
        };
        if let Some(end) = response[json_start..].find("```") {
            return response[json_start..json_start + end].trim();
        }
    }

    // Try to find an array, then an object, directly
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (response.find(open), response.rfind(close)) {
            if end > start {
                return &response[start..=end];
            }
        }
    }

    response.trim()
}

/// Parse the screenshot breakdown returned by the model
pub fn parse_requirements_response(response: &str) -> Result<Vec<RawRequirement>, AiError> {
    if response.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }

    let json_str = extract_json(response);
    let list: RecordList = serde_json::from_str(json_str).map_err(|e| {
        AiError::InvalidResponse(format!(
            "Failed to parse requirements response: {}. JSON: {}",
            e,
            json_str.chars().take(200).collect::<String>()
        ))
    })?;

    Ok(match list {
        RecordList::Bare(records) => records,
        RecordList::Wrapped { items } => items,
    })
}

/// Normalizes parsed records into requirement items, in order
///
/// Records without a function name carry nothing to edit and are skipped.
pub fn normalize_records(records: Vec<RawRequirement>) -> Vec<RequirementItem> {
    let total = records.len();
    let items: Vec<RequirementItem> = records
        .into_iter()
        .filter(|r| r.function_name.is_some())
        .map(RawRequirement::into_item)
        .collect();

    if items.len() < total {
        log::warn!(
            "Skipped {} records without a functionName",
            total - items.len()
        );
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let response = r#"[{"region": "查询区", "functionName": "客户名称"}]"#;
        let records = parse_requirements_response(response).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region.as_deref(), Some("查询区"));
        assert_eq!(records[0].function_name.as_deref(), Some("客户名称"));
        assert!(records[0].description.is_none());
    }

    #[test]
    fn test_parse_markdown_wrapped() {
        let response = r#"Here you go:

```json
[
  {"region": "Nav", "functionName": "Login", "description": ""}
]
```
"#;
        let records = parse_requirements_response(response).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_items_object() {
        let response = r#"{"items": [{"region": "Nav", "functionName": "Login"}]}"#;
        assert_eq!(parse_requirements_response(response).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(matches!(
            parse_requirements_response("   \n"),
            Err(AiError::EmptyResponse)
        ));
    }

    #[test]
    fn test_parse_malformed_response() {
        assert!(matches!(
            parse_requirements_response("[{\"region\": \"Nav\""),
            Err(AiError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_requirements_response("no json here"),
            Err(AiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_missing_description_becomes_empty() {
        let response = r#"[
            {"region": "Nav", "functionName": "Login", "description": "Opens dialog"},
            {"region": "Nav", "functionName": "Logout"}
        ]"#;
        let items = normalize_records(parse_requirements_response(response).unwrap());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Opens dialog");
        assert_eq!(items[1].description, "");
        assert_eq!(items[1].scope, "");
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn test_blank_region_becomes_unnamed() {
        let items = normalize_records(vec![RawRequirement {
            region: Some("  ".to_string()),
            function_name: Some("Help".to_string()),
            ..RawRequirement::default()
        }]);
        assert_eq!(items[0].region, UNNAMED_REGION);
    }

    #[test]
    fn test_records_without_function_name_skipped() {
        let items = normalize_records(vec![
            RawRequirement {
                region: Some("Nav".to_string()),
                ..RawRequirement::default()
            },
            RawRequirement {
                region: Some("Nav".to_string()),
                function_name: Some("Login".to_string()),
                ..RawRequirement::default()
            },
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].function_name, "Login");
    }

    #[test]
    fn test_snake_case_alias() {
        let records =
            parse_requirements_response(r#"[{"region": "Nav", "function_name": "Login"}]"#)
                .unwrap();
        assert_eq!(records[0].function_name.as_deref(), Some("Login"));
    }
}
