/// OpenAI API request/response types
///
/// These types match the OpenAI Chat Completions API format.
/// API Documentation: https://platform.openai.com/docs/api-reference/chat/create
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// OpenAI Chat Completion Request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiRequest {
    /// Model ID (e.g. "gpt-4.1")
    pub model: String,

    pub messages: Vec<OpenAiMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<OpenAiResponseFormat>,
}

/// Message in OpenAI format
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiMessage {
    /// "system", "user", or "assistant"
    pub role: String,
    pub content: String,
}

/// Response format selector ("text" or "json_object")
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    pub type_: String,
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// OpenAI Chat Completion Response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponse {
    pub model: String,
    pub choices: Vec<OpenAiChoice>,
}

/// A single choice in the response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiResponseMessage,
    pub finish_reason: String,
}

/// Response message from the assistant
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponseMessage {
    pub role: String,
    pub content: String,
}
