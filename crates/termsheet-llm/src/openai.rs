//! OpenAI Service Implementation
//!
//! Talks to the OpenAI files and chat completions APIs (or any server that
//! mirrors them).
//!
//! # Features
//!
//! - Multipart document upload, returning the remote file id as the handle
//! - Structured completions with a strict `json_schema` response format
//! - Remote file deletion for handle release
//!
//! Retrying is the caller's concern; every method issues exactly one request.
//!
//! # Examples
//!
//! ```no_run
//! use termsheet_llm::OpenAiService;
//!
//! let service = OpenAiService::new("sk-...").unwrap()
//!     .with_base_url("http://localhost:8080/v1");
//! ```

use crate::LlmError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use termsheet_domain::{CompletionRequest, DocumentHandle, ModelService};
use tracing::debug;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for a single HTTP request (5 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Purpose attached to uploaded documents
pub const UPLOAD_PURPOSE: &str = "user_data";

/// OpenAI-backed model service
pub struct OpenAiService {
    base_url: String,
    api_key: String,
    client: Client,
}

/// Request body for chat completions
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Value,
    response_format: &'a Value,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiService {
    /// Create a service for the public OpenAI API
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Point the service at another OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn messages(request: &CompletionRequest) -> Value {
        json!([
            { "role": "system", "content": request.system_prompt },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": request.user_prompt },
                    { "type": "file", "file": { "file_id": request.document.id() } }
                ]
            }
        ])
    }
}

/// Name under which a document is uploaded
///
/// The upload endpoint only recognises a lowercase `.pdf` extension, so an
/// uppercase or mixed-case one is rewritten. Other names pass through.
pub fn upload_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("pdf") => format!("{}.pdf", stem),
        _ => filename.to_string(),
    }
}

/// Map a non-success status to an error, passing successful responses through
async fn check_status(response: Response, resource: &str) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimitExceeded);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(LlmError::ModelNotAvailable(resource.to_string()));
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)))
}

#[async_trait]
impl ModelService for OpenAiService {
    type Error = LlmError;

    async fn upload_document(&self, filename: &str, bytes: &[u8]) -> Result<DocumentHandle, Self::Error> {
        let name = upload_filename(filename);
        let part = Part::bytes(bytes.to_vec())
            .file_name(name.clone())
            .mime_str("application/pdf")
            .map_err(|e| LlmError::Other(format!("Invalid mime type: {}", e)))?;
        let form = Form::new().text("purpose", UPLOAD_PURPOSE).part("file", part);

        debug!(filename = %name, size = bytes.len(), "Uploading document");

        let response = self
            .client
            .post(self.url("/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Upload failed: {}", e)))?;

        let file: FileObject = check_status(response, "files endpoint")
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse file object: {}", e)))?;

        Ok(DocumentHandle::new(file.id))
    }

    async fn complete_structured(&self, request: &CompletionRequest) -> Result<Option<String>, Self::Error> {
        let body = ChatRequest {
            model: &request.model,
            messages: Self::messages(request),
            response_format: &request.response_format,
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        let response = self
            .client
            .post(self.url("/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let chat: ChatResponse = check_status(response, &request.model)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let message = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(LlmError::Refused(refusal));
        }

        Ok(message.content.filter(|content| !content.is_empty()))
    }

    async fn release_document(&self, handle: &DocumentHandle) -> Result<(), Self::Error> {
        let response = self
            .client
            .delete(self.url(&format!("/files/{}", handle.id())))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Delete failed: {}", e)))?;

        check_status(response, handle.id()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service(server: &MockServer) -> OpenAiService {
        OpenAiService::new("sk-test").unwrap().with_base_url(server.uri())
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-2024-08-06".to_string(),
            system_prompt: "You extract contracts.".to_string(),
            user_prompt: "Extract this.".to_string(),
            document: DocumentHandle::new("file-123"),
            response_format: json!({ "type": "json_schema", "json_schema": { "strict": true } }),
            temperature: 0.1,
            max_output_tokens: 8192,
        }
    }

    fn chat_body(message: Value) -> Value {
        json!({ "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }] })
    }

    #[test]
    fn test_upload_filename() {
        assert_eq!(upload_filename("contract.PDF"), "contract.pdf");
        assert_eq!(upload_filename("Deal.Final.Pdf"), "Deal.Final.pdf");
        assert_eq!(upload_filename("contract.pdf"), "contract.pdf");
        assert_eq!(upload_filename("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let service = OpenAiService::new("k").unwrap().with_base_url("http://host/v1/");
        assert_eq!(service.base_url(), "http://host/v1");
    }

    #[tokio::test]
    async fn test_upload_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_string_contains("contract.pdf"))
            .and(body_string_contains(UPLOAD_PURPOSE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-abc" })))
            .expect(1)
            .mount(&server)
            .await;

        let handle = service(&server)
            .await
            .upload_document("contract.PDF", b"%PDF-1.7 test")
            .await
            .unwrap();
        assert_eq!(handle.id(), "file-abc");
    }

    #[tokio::test]
    async fn test_complete_structured_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-2024-08-06",
                "max_tokens": 8192,
                "response_format": { "type": "json_schema" }
            })))
            .and(body_string_contains("file-123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body(json!({ "role": "assistant", "content": "{\"a\":1}" }))),
            )
            .mount(&server)
            .await;

        let content = service(&server).await.complete_structured(&request()).await.unwrap();
        assert_eq!(content.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_complete_structured_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body(json!({ "role": "assistant", "content": null }))),
            )
            .mount(&server)
            .await;

        let content = service(&server).await.complete_structured(&request()).await.unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn test_refusal_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(json!({
                "role": "assistant",
                "content": null,
                "refusal": "I can't help with that."
            }))))
            .mount(&server)
            .await;

        let err = service(&server).await.complete_structured(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Refused(_)));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/files/file-gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let service = service(&server).await;
        let err = service.complete_structured(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimitExceeded));

        let err = service.release_document(&DocumentHandle::new("file-gone")).await.unwrap_err();
        assert!(matches!(err, LlmError::ModelNotAvailable(_)));

        let err = service.upload_document("a.pdf", b"x").await.unwrap_err();
        match err {
            LlmError::Communication(message) => assert!(message.contains("upstream down")),
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_release_document() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/files/file-123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "file-123", "deleted": true })),
            )
            .expect(1)
            .mount(&server)
            .await;

        service(&server)
            .await
            .release_document(&DocumentHandle::new("file-123"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let service = OpenAiService::new("k").unwrap().with_base_url("http://127.0.0.1:9");
        let err = service.upload_document("a.pdf", b"x").await.unwrap_err();
        assert!(matches!(err, LlmError::Communication(_)));
    }
}
