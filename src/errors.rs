/// Error taxonomy for the trading pipeline
///
/// Collector errors stop at the aggregation boundary: each one is logged and
/// converted to an absent snapshot. Cycle errors are fatal to the running
/// cycle; the next scheduled cycle is the retry mechanism.
use crate::apis::llm::LlmError;
use crate::decision::DecisionParseError;
use thiserror::Error;

/// Failure of a single snapshot collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The exchange rejected or failed one of the account/market queries
    #[error("market data provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The order book came back empty
    #[error("no market data for {0}")]
    NoMarketData(String),

    /// Fewer candles than requested
    #[error("insufficient history: wanted {wanted} candles, got {got}")]
    InsufficientHistory { wanted: usize, got: usize },

    /// Sentiment/news provider failed; callers treat sentiment as optional
    #[error("signal provider unavailable: {0}")]
    SignalProviderUnavailable(String),
}

/// Fatal failure of a trading cycle. No trade is dispatched on any of these.
#[derive(Debug, Error)]
pub enum CycleError {
    /// A required snapshot (account, order book, or market) is absent
    #[error("cycle abandoned: {0} snapshot missing")]
    MissingSnapshot(&'static str),

    /// The reasoning service call failed (transport, auth, timeout)
    #[error("reasoning service error: {0}")]
    Reasoning(#[from] LlmError),

    /// The model response could not be parsed into a valid decision
    #[error("unparsable response: {0}")]
    Unparsable(#[from] DecisionParseError),
}
