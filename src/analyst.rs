//! Recommendation requester
//!
//! Renders the analysis payload into a fixed prompt, makes exactly one
//! single-turn call to the reasoning service, and hands the raw text back.
//! No interpretation happens here, and a failed call is not retried inside
//! the cycle; the next scheduled cycle is the retry.

use crate::aggregator::AnalysisPayload;
use crate::apis::llm::{ChatMessage, ChatRequest, LlmClient, LlmError};
use crate::logger::{self, LogTag};

/// Fixed system instruction. The output schema example is load-bearing: the
/// decision parser expects exactly these fields.
const SYSTEM_PROMPT: &str = r#"You are an expert trading analyst. Analyze the provided data and give a trading decision based on:
1. Current market status and order book depth
2. Technical analysis (OHLCV data with indicators)
3. Market sentiment and news, when present
4. Current position status

Your response must be a single JSON object in exactly the following format:
{
    "decision": "<buy/sell/hold>",
    "reason": "<detailed analysis>",
    "risk_level": "<low/medium/high>",
    "confidence_score": <integer 0-100>
}"#;

/// Render the user turn for a payload.
pub fn render_user_message(payload: &AnalysisPayload) -> Result<String, LlmError> {
    let serialized = serde_json::to_string(payload)
        .map_err(|e| LlmError::InvalidResponse(format!("payload serialization failed: {}", e)))?;
    Ok(format!(
        "Please analyze this market data and provide your decision: {}",
        serialized
    ))
}

/// Submit the payload to the reasoning service and return the raw response
/// text verbatim.
pub async fn request_recommendation(
    llm: &dyn LlmClient,
    model: &str,
    payload: &AnalysisPayload,
) -> Result<String, LlmError> {
    let user_message = render_user_message(payload)?;

    logger::debug(
        LogTag::Analyst,
        &format!(
            "requesting recommendation: model={} prompt_chars={}",
            model,
            user_message.len()
        ),
    );

    let request = ChatRequest::new(
        model,
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_message),
        ],
    )
    .with_json_mode();

    let response = llm.chat(request).await?;

    logger::debug(
        LogTag::Analyst,
        &format!(
            "response received: finish_reason={} chars={}",
            response.finish_reason,
            response.content.len()
        ),
    );

    Ok(response.content)
}
