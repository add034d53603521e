use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::LanguageModelService;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn generate_endpoint(base_url: &str, model: &str) -> String {
        format!(
            "{}/{}:generateContent",
            base_url.trim_end_matches('/'),
            model.trim()
        )
    }
}

#[async_trait]
impl LanguageModelService for GeminiClient {
    async fn generate(&self, instructions: &str, prompt: &str) -> AppResult<String> {
        let request_body = GenerateContentRequest::new(instructions, prompt);
        debug!(model = %self.model, prompt_len = prompt.len(), "calling Gemini");

        let response = self
            .http
            .post(Self::generate_endpoint(&self.base_url, &self.model))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                AppError::ModelInteraction(format!("failed to call Gemini: {}", err.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::ModelInteraction(format!(
                "Gemini responded with {status}: {body}"
            )));
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|err| {
            AppError::ModelInteraction(format!(
                "failed to parse Gemini response: {}",
                err.without_url()
            ))
        })?;

        payload.into_text().ok_or_else(|| {
            AppError::ModelInteraction("Gemini response contained no text".to_string())
        })
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
}

impl GenerateContentRequest {
    fn new(instructions: &str, prompt: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiPart {
                        text: instructions.to_string(),
                    },
                    GeminiPart {
                        text: prompt.to_string(),
                    },
                ],
            }],
        }
    }
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text = candidate
            .content?
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<String>();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    const PATH: &str = "/gemini-2.5-pro:generateContent";

    fn client(server: &mockito::Server) -> GeminiClient {
        GeminiClient::new(
            "secret".to_string(),
            "gemini-2.5-pro".to_string(),
            server.url(),
        )
    }

    #[tokio::test]
    async fn sends_instructions_and_prompt_as_two_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "secret")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{
                    "parts": [{ "text": "be literal" }, { "text": "User Story: x" }]
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"{\"ticket_draft\":"},{"text":"\"x\"}"}]}}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let text = client(&server)
            .generate("be literal", "User Story: x")
            .await
            .unwrap();

        assert_eq!(text, r#"{"ticket_draft":"x"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reports_error_status_with_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let err = client(&server).generate("i", "p").await.unwrap_err();
        match err {
            AppError::ModelInteraction(message) => {
                assert!(message.contains("503"));
                assert!(message.contains("overloaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidates_are_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let err = client(&server).generate("i", "p").await.unwrap_err();
        assert!(matches!(err, AppError::ModelInteraction(_)));
    }

    #[tokio::test]
    async fn transport_failure_does_not_reveal_the_key() {
        let client = GeminiClient::new(
            "SUPERSECRETKEY".to_string(),
            "gemini-2.5-pro".to_string(),
            "http://127.0.0.1:1".to_string(),
        );
        let err = client.generate("i", "p").await.unwrap_err();
        assert!(matches!(err, AppError::ModelInteraction(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn undecodable_body_does_not_reveal_the_key() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = client(&server).generate("i", "p").await.unwrap_err();
        assert!(matches!(err, AppError::ModelInteraction(_)));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn builds_endpoint_without_double_slash() {
        assert_eq!(
            GeminiClient::generate_endpoint("https://example.test/v1beta/models/", "gemini-2.5-pro"),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }
}
