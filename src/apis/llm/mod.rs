/// Reasoning service clients
///
/// Provider-neutral chat types plus the OpenAI implementation. The pipeline
/// makes exactly one single-turn, non-streaming call per trading cycle.
pub mod openai;
pub mod types;

pub use self::openai::OpenAiClient;
pub use self::types::{
    ChatMessage, ChatRequest, ChatResponse, LlmError, MessageRole, ResponseFormat,
};

use async_trait::async_trait;

/// Reasoning Service interface: one prompt in, free text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;
}
