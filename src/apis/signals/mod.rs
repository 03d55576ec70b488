/// Signal provider client (sentiment index + news headlines)
///
/// Two upstream services behind one interface:
/// - Alternative.me Fear & Greed index (keyless)
/// - CryptoPanic headline feed (auth token required)
///
/// Endpoints:
/// - GET https://api.alternative.me/fng/?limit=N
/// - GET https://cryptopanic.com/api/v1/posts/?auth_token=...&currencies=...
pub mod types;

pub use self::types::{
    CryptoPanicPost, CryptoPanicResponse, CryptoPanicSource, FngEntry, FngResponse,
};

use crate::apis::client::HttpClient;
use crate::logger::{self, LogTag};
use crate::types::{NewsItem, SentimentEntry, SentimentLabel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ============================================================================
// API CONFIGURATION
// ============================================================================

const FNG_URL: &str = "https://api.alternative.me/fng/";
const CRYPTOPANIC_URL: &str = "https://cryptopanic.com/api/v1/posts/";
const TIMEOUT_SECS: u64 = 10;

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Signal Provider interface: raw sentiment readings and headlines.
/// Derived fields (average, trend) are the sentiment collector's job.
#[async_trait]
pub trait SignalApi: Send + Sync {
    /// Most recent `window` index readings in chronological order
    async fn get_sentiment_index(&self, window: usize) -> Result<Vec<SentimentEntry>, String>;

    /// Latest headlines for a topic (currency code), newest first
    async fn get_headlines(&self, topic: &str, limit: usize) -> Result<Vec<NewsItem>, String>;
}

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

/// Combined signal provider client
pub struct SignalClient {
    cryptopanic_api_key: Option<String>,
    http: HttpClient,
}

impl SignalClient {
    pub fn new(cryptopanic_api_key: Option<String>) -> Result<Self, String> {
        Ok(Self {
            cryptopanic_api_key,
            http: HttpClient::new(TIMEOUT_SECS)?,
        })
    }
}

#[async_trait]
impl SignalApi for SignalClient {
    async fn get_sentiment_index(&self, window: usize) -> Result<Vec<SentimentEntry>, String> {
        logger::debug(LogTag::Api, &format!("[FNG] GET index, limit={}", window));

        let response = self
            .http
            .client()
            .get(FNG_URL)
            .query(&[("limit", window.to_string())])
            .send()
            .await
            .map_err(|e| format!("Fear & Greed request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Fear & Greed request returned {}: {}", status, body));
        }

        let parsed = response
            .json::<FngResponse>()
            .await
            .map_err(|e| format!("Failed to decode Fear & Greed response: {}", e))?;

        if parsed.data.is_empty() {
            return Err("Fear & Greed response contained no readings".to_string());
        }

        // Wire order is newest-first; flip into chronological order
        let mut entries: Vec<SentimentEntry> = parsed
            .data
            .iter()
            .map(|e| {
                let score = e
                    .value
                    .parse::<u8>()
                    .map_err(|err| format!("Bad index value {}: {}", e.value, err))?;
                let secs = e
                    .timestamp
                    .parse::<i64>()
                    .map_err(|err| format!("Bad index timestamp {}: {}", e.timestamp, err))?;
                let date = DateTime::<Utc>::from_timestamp(secs, 0)
                    .ok_or_else(|| format!("Out-of-range index timestamp {}", secs))?
                    .date_naive();

                Ok(SentimentEntry {
                    date,
                    score,
                    label: SentimentLabel::from_classification(&e.value_classification),
                })
            })
            .collect::<Result<_, String>>()?;
        entries.reverse();

        Ok(entries)
    }

    async fn get_headlines(&self, topic: &str, limit: usize) -> Result<Vec<NewsItem>, String> {
        let auth_token = self
            .cryptopanic_api_key
            .as_deref()
            .ok_or_else(|| "No CryptoPanic credential configured".to_string())?;

        logger::debug(
            LogTag::Api,
            &format!("[CRYPTOPANIC] GET posts, topic={} limit={}", topic, limit),
        );

        let response = self
            .http
            .client()
            .get(CRYPTOPANIC_URL)
            .query(&[
                ("auth_token", auth_token),
                ("currencies", topic),
                ("public", "true"),
            ])
            .send()
            .await
            .map_err(|e| format!("Headline request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Headline request returned {}: {}", status, body));
        }

        let parsed = response
            .json::<CryptoPanicResponse>()
            .await
            .map_err(|e| format!("Failed to decode headline response: {}", e))?;

        Ok(parsed
            .results
            .into_iter()
            .take(limit)
            .map(|post| NewsItem {
                title: post.title,
                source: post.source.title,
                url: post.url,
                published_at: post.published_at,
                summary: None,
            })
            .collect())
    }
}
