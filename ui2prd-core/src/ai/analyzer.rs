//! Screenshot Analyzer
//!
//! Sends one screenshot to the vision model and turns its answer into
//! requirement items.

use std::sync::Arc;

use crate::ai::client::{AiError, VisionClient, VisionRequest};
use crate::ai::prompts::{build_response_schema, SCREENSHOT_ANALYSIS_PROMPT};
use crate::ai::responses::{normalize_records, parse_requirements_response};
use crate::image::ImagePayload;
use crate::models::RequirementItem;

/// Runs screenshot analysis against a vision client
#[derive(Clone)]
pub struct Analyzer {
    client: Arc<dyn VisionClient>,
    schema: serde_json::Value,
}

impl Analyzer {
    pub fn new(client: Arc<dyn VisionClient>) -> Self {
        Self {
            client,
            schema: build_response_schema(),
        }
    }

    pub fn describe(&self) -> String {
        self.client.describe()
    }

    /// Analyze a screenshot into draft requirement items
    ///
    /// A missing or blank key fails before any request is made. An empty
    /// reply is an error, but a well-formed empty list is not.
    pub fn analyze(
        &self,
        image: &ImagePayload,
        api_key: Option<&str>,
    ) -> Result<Vec<RequirementItem>, AiError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AiError::MissingCredential)?;

        log::info!(
            "Analyzing {} screenshot ({} bytes) with {}",
            image.format(),
            image.len(),
            self.client.describe()
        );

        let request = VisionRequest {
            api_key,
            prompt: SCREENSHOT_ANALYSIS_PROMPT,
            image,
            response_schema: &self.schema,
        };
        let text = self.client.generate(&request)?;
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }

        let items = normalize_records(parse_requirements_response(&text)?);
        log::info!("Analysis produced {} items", items.len());
        Ok(items)
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("client", &self.client.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::MockVisionClient;
    use crate::image::DEFAULT_MAX_IMAGE_BYTES;
    use crate::models::UNNAMED_REGION;

    fn jpeg() -> ImagePayload {
        ImagePayload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0], DEFAULT_MAX_IMAGE_BYTES)
            .unwrap()
    }

    fn analyzer(mock: MockVisionClient) -> (Analyzer, Arc<MockVisionClient>) {
        let mock = Arc::new(mock);
        (Analyzer::new(mock.clone()), mock)
    }

    #[test]
    fn test_analyze_returns_items_in_order() {
        let (analyzer, mock) = analyzer(MockVisionClient::new(
            r#"[
                {"region": "查询区", "functionName": "客户名称"},
                {"region": "查询区", "functionName": "查询"},
                {"region": "", "functionName": "帮助"}
            ]"#,
        ));

        let items = analyzer.analyze(&jpeg(), Some("key")).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.function_name.as_str()).collect();
        assert_eq!(names, ["客户名称", "查询", "帮助"]);
        assert_eq!(items[2].region, UNNAMED_REGION);
        assert!(items.iter().all(|i| i.description.is_empty()));

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].mime_type, "image/jpeg");
        assert_eq!(requests[0].prompt, SCREENSHOT_ANALYSIS_PROMPT);
    }

    #[test]
    fn test_missing_key_makes_no_request() {
        let (analyzer, mock) = analyzer(MockVisionClient::new("[]"));
        assert!(matches!(
            analyzer.analyze(&jpeg(), None),
            Err(AiError::MissingCredential)
        ));
        assert!(matches!(
            analyzer.analyze(&jpeg(), Some("  ")),
            Err(AiError::MissingCredential)
        ));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_empty_reply_is_error() {
        let (analyzer, _) = analyzer(MockVisionClient::new(""));
        assert!(matches!(
            analyzer.analyze(&jpeg(), Some("key")),
            Err(AiError::EmptyResponse)
        ));
    }

    #[test]
    fn test_empty_list_is_ok() {
        let (analyzer, _) = analyzer(MockVisionClient::new("[]"));
        assert!(analyzer.analyze(&jpeg(), Some("key")).unwrap().is_empty());
    }

    #[test]
    fn test_client_errors_propagate() {
        let (analyzer, _) = analyzer(MockVisionClient::failing(AiError::InvalidCredential(
            "API key not valid".to_string(),
        )));
        let err = analyzer.analyze(&jpeg(), Some("bad")).unwrap_err();
        assert!(err.is_credential_error());
    }

    #[test]
    fn test_malformed_reply() {
        let (analyzer, _) = analyzer(MockVisionClient::new("I could not read the image."));
        assert!(matches!(
            analyzer.analyze(&jpeg(), Some("key")),
            Err(AiError::InvalidResponse(_))
        ));
    }
}
