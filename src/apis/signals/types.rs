/// Signal provider response types
///
/// Covers the Alternative.me Fear & Greed index and the CryptoPanic
/// headline feed.
use chrono::{DateTime, Utc};
use serde::Deserialize;

// ============================================================================
// FEAR & GREED INDEX (https://api.alternative.me/fng/)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct FngResponse {
    pub data: Vec<FngEntry>,
}

/// One index reading. Numeric fields arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct FngEntry {
    /// Score 0-100
    pub value: String,

    /// Classification, e.g. "Extreme Fear", "Greed"
    pub value_classification: String,

    /// Unix timestamp (seconds), as a string
    pub timestamp: String,
}

// ============================================================================
// CRYPTOPANIC HEADLINES (https://cryptopanic.com/developers/api/)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoPanicResponse {
    pub results: Vec<CryptoPanicPost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoPanicPost {
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source: CryptoPanicSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoPanicSource {
    pub title: String,
}
