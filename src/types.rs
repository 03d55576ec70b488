use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum order-book levels kept per side at collection time
pub const ORDER_BOOK_DEPTH: usize = 5;

/// Order-book levels per side forwarded to the reasoning service
pub const PROMPT_BOOK_DEPTH: usize = 3;

/// Account state at collection time. Built once per cycle, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub cash_balance: f64,
    pub position_size: f64,
    pub average_entry_price: f64,
    pub mark_price: f64,
    pub total_value: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_pct: f64,
}

impl AccountSnapshot {
    /// Derive the snapshot from raw provider values.
    ///
    /// `unrealized_pnl_pct` uses the conventional ratio definition
    /// `((mark / avg_entry) - 1) * 100`, not the broken difference form.
    pub fn derive(
        cash_balance: f64,
        position_size: f64,
        average_entry_price: f64,
        mark_price: f64,
    ) -> Self {
        let has_position = position_size > 0.0;
        let unrealized_pnl = if has_position {
            (mark_price - average_entry_price) * position_size
        } else {
            0.0
        };
        let unrealized_pnl_pct = if has_position && average_entry_price > 0.0 {
            ((mark_price / average_entry_price) - 1.0) * 100.0
        } else {
            0.0
        };

        Self {
            cash_balance,
            position_size,
            average_entry_price,
            mark_price,
            total_value: cash_balance + position_size * mark_price,
            unrealized_pnl,
            unrealized_pnl_pct,
        }
    }
}

/// One price level of the order book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub size: f64,
}

/// Order book at collection time.
///
/// Invariant: `ask_levels` ascending by price, `bid_levels` descending, both
/// at most ORDER_BOOK_DEPTH entries (closest to mid first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_ask_volume: f64,
    pub total_bid_volume: f64,
    pub ask_levels: Vec<OrderBookLevel>,
    pub bid_levels: Vec<OrderBookLevel>,
}

impl OrderBookSnapshot {
    /// Copy with both sides truncated to `depth` levels (closest to mid kept)
    pub fn truncated(&self, depth: usize) -> Self {
        let mut out = self.clone();
        out.ask_levels.truncate(depth);
        out.bid_levels.truncate(depth);
        out
    }
}

/// Single OHLCV candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle interval supported by the market collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleInterval {
    Day,
    Hour,
}

/// Per-bar indicator extension of a candle.
///
/// `None` means insufficient history at that bar, never zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub bb_high: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_low: Option<f64>,
    /// %b: position of close within the band, undefined on zero width
    pub bb_percent: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_diff: Option<f64>,
    pub sma_5: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_60: Option<f64>,
    pub sma_120: Option<f64>,
    pub atr: Option<f64>,
}

/// Headline oscillator values from the final daily row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestIndicators {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bb_percent: Option<f64>,
}

/// Indicator-annotated market view: recent daily and hourly tails plus the
/// latest daily oscillator row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub daily: Vec<IndicatorRow>,
    pub hourly: Vec<IndicatorRow>,
    pub latest: LatestIndicators,
}

/// Fear & Greed style sentiment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl SentimentLabel {
    /// Map an index classification string to a label (case-insensitive)
    pub fn from_classification(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "extreme fear" => SentimentLabel::ExtremeFear,
            "fear" => SentimentLabel::Fear,
            "greed" => SentimentLabel::Greed,
            "extreme greed" => SentimentLabel::ExtremeGreed,
            _ => SentimentLabel::Neutral,
        }
    }
}

/// Direction of the sentiment index relative to its recent average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentTrend {
    Improving,
    Deteriorating,
}

/// One historical sentiment reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentEntry {
    pub date: NaiveDate,
    pub score: u8,
    pub label: SentimentLabel,
}

/// Market sentiment at collection time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub score: u8,
    pub label: SentimentLabel,
    pub history: Vec<SentimentEntry>,
    pub trend: SentimentTrend,
    pub average: f64,
}

/// One news headline from the signal provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub summary: Option<String>,
}

/// Receipt returned by the execution provider for a submitted order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub uuid: String,
    pub side: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_snapshot_derivation() {
        let snap = AccountSnapshot::derive(1_000_000.0, 0.5, 100_000.0, 110_000.0);

        assert!((snap.unrealized_pnl - 5_000.0).abs() < 1e-9);
        assert!((snap.unrealized_pnl_pct - 10.0).abs() < 1e-9);
        assert!((snap.total_value - 1_055_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_account_snapshot_flat_position() {
        let snap = AccountSnapshot::derive(500_000.0, 0.0, 0.0, 110_000.0);

        assert_eq!(snap.unrealized_pnl, 0.0);
        assert_eq!(snap.unrealized_pnl_pct, 0.0);
        assert_eq!(snap.total_value, 500_000.0);
    }

    #[test]
    fn test_sentiment_label_mapping() {
        assert_eq!(
            SentimentLabel::from_classification("Extreme Fear"),
            SentimentLabel::ExtremeFear
        );
        assert_eq!(
            SentimentLabel::from_classification("greed"),
            SentimentLabel::Greed
        );
        assert_eq!(
            SentimentLabel::from_classification("whatever"),
            SentimentLabel::Neutral
        );
    }
}
