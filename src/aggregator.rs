//! Analysis payload assembly
//!
//! Pure merge of whichever snapshots succeeded. The payload is bounded by
//! construction: top-3 order-book levels per side and tail-windowed indicator
//! rows, because the reasoning service has a finite context budget and a
//! long-running deployment would otherwise grow the prompt without limit.

use crate::errors::CycleError;
use crate::types::{
    AccountSnapshot, MarketSnapshot, NewsItem, OrderBookSnapshot, SentimentSnapshot,
    PROMPT_BOOK_DEPTH,
};
use serde::Serialize;

/// Everything the reasoning service sees for one cycle.
///
/// Built fresh per cycle, never mutated, consumed exactly once by the
/// analyst.
#[derive(Debug, Serialize)]
pub struct AnalysisPayload {
    pub pair: String,
    pub account: AccountSnapshot,
    pub order_book: OrderBookSnapshot,
    pub market: MarketSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<NewsItem>>,
}

/// Assemble the payload, or abandon the cycle if a required snapshot is
/// absent. Sentiment (and news) alone may be missing.
pub fn build_payload(
    pair: &str,
    account: Option<AccountSnapshot>,
    order_book: Option<OrderBookSnapshot>,
    market: Option<MarketSnapshot>,
    sentiment: Option<SentimentSnapshot>,
    news: Option<Vec<NewsItem>>,
) -> Result<AnalysisPayload, CycleError> {
    let account = account.ok_or(CycleError::MissingSnapshot("account"))?;
    let order_book = order_book.ok_or(CycleError::MissingSnapshot("order book"))?;
    let market = market.ok_or(CycleError::MissingSnapshot("market"))?;

    Ok(AnalysisPayload {
        pair: pair.to_string(),
        account,
        // Collection keeps 5 levels; the prompt view only needs 3
        order_book: order_book.truncated(PROMPT_BOOK_DEPTH),
        market,
        sentiment,
        news,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LatestIndicators, OrderBookLevel};
    use chrono::Utc;

    fn account() -> AccountSnapshot {
        AccountSnapshot::derive(1_000_000.0, 0.1, 90_000.0, 100_000.0)
    }

    fn book(levels: usize) -> OrderBookSnapshot {
        let asks = (0..levels)
            .map(|i| OrderBookLevel {
                price: 101.0 + i as f64,
                size: 1.0,
            })
            .collect();
        let bids = (0..levels)
            .map(|i| OrderBookLevel {
                price: 100.0 - i as f64,
                size: 1.0,
            })
            .collect();
        OrderBookSnapshot {
            timestamp: Utc::now(),
            total_ask_volume: levels as f64,
            total_bid_volume: levels as f64,
            ask_levels: asks,
            bid_levels: bids,
        }
    }

    fn market() -> MarketSnapshot {
        MarketSnapshot {
            daily: vec![],
            hourly: vec![],
            latest: LatestIndicators {
                rsi: Some(55.0),
                macd: None,
                macd_signal: None,
                bb_percent: None,
            },
        }
    }

    #[test]
    fn test_payload_re_truncates_order_book() {
        let payload = build_payload(
            "KRW-BTC",
            Some(account()),
            Some(book(5)),
            Some(market()),
            None,
            None,
        )
        .unwrap();

        assert_eq!(payload.order_book.ask_levels.len(), PROMPT_BOOK_DEPTH);
        assert_eq!(payload.order_book.bid_levels.len(), PROMPT_BOOK_DEPTH);
    }

    #[test]
    fn test_missing_order_book_abandons_cycle() {
        let err = build_payload(
            "KRW-BTC",
            Some(account()),
            None,
            Some(market()),
            None,
            None,
        )
        .unwrap_err();

        assert!(matches!(err, CycleError::MissingSnapshot("order book")));
    }

    #[test]
    fn test_sentiment_is_optional() {
        let payload = build_payload(
            "KRW-BTC",
            Some(account()),
            Some(book(5)),
            Some(market()),
            None,
            None,
        )
        .unwrap();

        assert!(payload.sentiment.is_none());
        assert!(payload.news.is_none());

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("sentiment").is_none());
        assert!(json.get("account").is_some());
    }
}
