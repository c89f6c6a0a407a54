use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TextGenerator;
use crate::error::RoastError;
use crate::server::config::GeminiConfiguration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfiguration) -> Self {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Self {
            http_client: Client::new(),
            endpoint,
            api_key: config.api_key.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, RoastError> {
        let req = GenerateContentRequest::from_prompt(prompt);

        let resp = self
            .http_client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| RoastError::GenerationFailed(format!("HTTP error: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RoastError::GenerationFailed(format!(
                "Model returned {}: {}",
                status, body
            )));
        }

        let body = resp
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| RoastError::GenerationFailed(format!("Invalid response: {}", e)))?;

        body.text()
    }
}

// Wire models

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, with all of its parts joined.
    pub fn text(self) -> Result<String, RoastError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(RoastError::GenerationFailed(format!(
                "Prompt blocked: {}",
                reason
            )));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| RoastError::GenerationFailed("No candidates returned".to_string()))?;

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(RoastError::GenerationFailed(format!(
                "Empty candidate (finish reason: {})",
                reason
            )));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::testing::{unreachable_url, StubServer};
    use axum::http::{Method, StatusCode};

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn builds_endpoint_from_model() {
        let client = GeminiClient::new(&GeminiConfiguration {
            api_key: "key".to_string(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
        });

        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_wraps_prompt_as_user_content() {
        let req = GenerateContentRequest::from_prompt("roast me");

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "contents": [{ "role": "user", "parts": [{ "text": "roast me" }] }] })
        );
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let resp = parse(json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "Your taste " }, { "text": "is beige." }]
                    },
                    "finishReason": "STOP"
                },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ],
            "usageMetadata": { "promptTokenCount": 42 }
        }));

        assert_eq!(resp.text().unwrap(), "Your taste is beige.");
    }

    #[test]
    fn no_candidates_is_generation_failure() {
        let err = parse(json!({ "candidates": [] })).text().unwrap_err();
        assert!(matches!(err, RoastError::GenerationFailed(_)));
    }

    #[test]
    fn blocked_prompt_is_generation_failure() {
        let err = parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .text()
            .unwrap_err();

        assert_eq!(
            err,
            RoastError::GenerationFailed("Prompt blocked: SAFETY".to_string())
        );
    }

    #[test]
    fn empty_candidate_reports_finish_reason() {
        let err = parse(json!({
            "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }]
        }))
        .text()
        .unwrap_err();

        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(&GeminiConfiguration {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            base_url: format!("{}/v1beta", base_url),
        })
    }

    #[tokio::test]
    async fn posts_prompt_with_api_key() {
        let stub = StubServer::new().reply(
            GENERATE_PATH,
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Beige." }] },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        );
        let base_url = stub.start().await;

        let text = client(&base_url).generate("roast me").await.unwrap();

        assert_eq!(text, "Beige.");
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, GENERATE_PATH);
        assert_eq!(requests[0].header(API_KEY_HEADER), Some("test-key"));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&requests[0].body).unwrap(),
            json!({ "contents": [{ "role": "user", "parts": [{ "text": "roast me" }] }] })
        );
    }

    #[tokio::test]
    async fn error_status_is_generation_failure() {
        let stub = StubServer::new().reply(
            GENERATE_PATH,
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": { "code": 503, "message": "The model is overloaded." } })
                .to_string(),
        );
        let base_url = stub.start().await;

        let err = client(&base_url).generate("roast me").await.unwrap_err();

        match err {
            RoastError::GenerationFailed(detail) => {
                assert!(detail.starts_with("Model returned 503"), "{detail}");
                assert!(detail.contains("overloaded"), "{detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreadable_body_is_generation_failure() {
        let stub = StubServer::new().reply(GENERATE_PATH, StatusCode::OK, "<html>oops</html>");
        let base_url = stub.start().await;

        let err = client(&base_url).generate("roast me").await.unwrap_err();

        assert!(err.to_string().contains("Invalid response"), "{err}");
    }

    #[tokio::test]
    async fn unreachable_model_is_generation_failure() {
        let err = client(&unreachable_url().await)
            .generate("roast me")
            .await
            .unwrap_err();

        match err {
            RoastError::GenerationFailed(detail) => {
                assert!(detail.starts_with("HTTP error"), "{detail}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
