/// OpenAI API client (raw HTTP via reqwest)
///
/// Endpoints:
/// - POST https://api.openai.com/v1/chat/completions
///
/// Bearer token authentication, JSON mode via response_format.
pub mod types;

pub use self::types::{
    OpenAiChoice, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiResponseFormat,
    OpenAiResponseMessage,
};

use crate::apis::client::HttpClient;
use crate::apis::llm::{ChatRequest, ChatResponse, LlmClient, LlmError, MessageRole};
use crate::logger::{self, LogTag};
use async_trait::async_trait;

// ============================================================================
// API CONFIGURATION
// ============================================================================

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ENDPOINT_CHAT: &str = "/v1/chat/completions";
const TIMEOUT_SECS: u64 = 60;

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

/// OpenAI API client
pub struct OpenAiClient {
    api_key: String,
    http: HttpClient,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Result<Self, String> {
        if api_key.trim().is_empty() {
            return Err("OpenAI API key cannot be empty".to_string());
        }

        Ok(Self {
            api_key,
            http: HttpClient::new(TIMEOUT_SECS)?,
        })
    }

    /// Convert the unified ChatRequest to OpenAI wire format
    fn build_openai_request(&self, request: ChatRequest) -> OpenAiRequest {
        let messages = request
            .messages
            .into_iter()
            .map(|msg| OpenAiMessage {
                role: match msg.role {
                    MessageRole::System => "system".to_string(),
                    MessageRole::User => "user".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                },
                content: msg.content,
            })
            .collect();

        OpenAiRequest {
            model: request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .response_format
                .map(|rf| OpenAiResponseFormat { type_: rf.type_ }),
        }
    }

    /// Convert the OpenAI response to the unified ChatResponse
    fn parse_openai_response(&self, response: OpenAiResponse) -> Result<ChatResponse, LlmError> {
        let choice = response
            .choices
            .first()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(ChatResponse {
            content: choice.message.content.clone(),
            finish_reason: choice.finish_reason.clone(),
            model: response.model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}{}", OPENAI_BASE_URL, ENDPOINT_CHAT);
        let wire_request = self.build_openai_request(request);

        logger::debug(
            LogTag::Api,
            &format!("[OPENAI] Calling chat completions: model={}", wire_request.model),
        );

        let response_result = self
            .http
            .client()
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&wire_request)
            .send()
            .await;

        let response = response_result.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    timeout_ms: self.http.timeout().as_millis() as u64,
                }
            } else {
                LlmError::Network(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => LlmError::Auth("Invalid API key".to_string()),
                429 => LlmError::RateLimited,
                code => LlmError::Api {
                    status: code,
                    message: error_body,
                },
            });
        }

        let parsed = response
            .json::<OpenAiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to decode response: {}", e)))?;

        self.parse_openai_response(parsed)
    }
}
