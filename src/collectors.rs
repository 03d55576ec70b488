//! Snapshot collectors
//!
//! Four independent, independently-fallible collectors feeding the
//! aggregator. Each returns `Result<T, CollectorError>`; the cycle converts
//! failures into absent snapshots at this boundary, so one bad provider never
//! aborts the others.

use crate::apis::signals::SignalApi;
use crate::apis::upbit::ExchangeApi;
use crate::errors::CollectorError;
use crate::indicators;
use crate::logger::{self, LogTag};
use crate::types::{
    AccountSnapshot, CandleInterval, MarketSnapshot, NewsItem, OrderBookSnapshot,
    SentimentSnapshot, SentimentTrend, ORDER_BOOK_DEPTH,
};

/// Daily candles requested per cycle
pub const DAILY_CANDLE_COUNT: usize = 30;
/// Hourly candles requested per cycle
pub const HOURLY_CANDLE_COUNT: usize = 24;
/// Daily indicator rows forwarded to the payload
pub const DAILY_TAIL_LEN: usize = 7;
/// Hourly indicator rows forwarded to the payload
pub const HOURLY_TAIL_LEN: usize = 6;
/// Sentiment index readings fetched per cycle
pub const SENTIMENT_WINDOW: usize = 7;
/// Headlines fetched per cycle
pub const HEADLINE_LIMIT: usize = 5;

/// Collect the account snapshot.
///
/// All four queries must succeed; a partially-filled snapshot is never
/// returned.
pub async fn collect_account(
    exchange: &dyn ExchangeApi,
    pair: &str,
) -> Result<AccountSnapshot, CollectorError> {
    let cash = exchange
        .get_cash_balance()
        .await
        .map_err(CollectorError::ProviderUnavailable)?;
    let position = exchange
        .get_position_balance(pair)
        .await
        .map_err(CollectorError::ProviderUnavailable)?;
    let avg_entry = exchange
        .get_average_entry_price(pair)
        .await
        .map_err(CollectorError::ProviderUnavailable)?;
    let mark = exchange
        .get_mark_price(pair)
        .await
        .map_err(CollectorError::ProviderUnavailable)?;

    let snapshot = AccountSnapshot::derive(cash, position, avg_entry, mark);
    logger::debug(
        LogTag::Collector,
        &format!(
            "account: cash={:.0} position={:.8} pnl={:.2}%",
            snapshot.cash_balance, snapshot.position_size, snapshot.unrealized_pnl_pct
        ),
    );
    Ok(snapshot)
}

/// Collect the order book, truncated to the top levels per side.
pub async fn collect_order_book(
    exchange: &dyn ExchangeApi,
    pair: &str,
) -> Result<OrderBookSnapshot, CollectorError> {
    let book = exchange
        .get_order_book(pair)
        .await
        .map_err(CollectorError::ProviderUnavailable)?;

    if book.ask_levels.is_empty() && book.bid_levels.is_empty() {
        return Err(CollectorError::NoMarketData(pair.to_string()));
    }

    let book = book.truncated(ORDER_BOOK_DEPTH);
    logger::debug(
        LogTag::Collector,
        &format!(
            "order book: {} asks / {} bids, total {:.4}/{:.4}",
            book.ask_levels.len(),
            book.bid_levels.len(),
            book.total_ask_volume,
            book.total_bid_volume
        ),
    );
    Ok(book)
}

/// Collect candles on both intervals and run the indicator engine.
pub async fn collect_market(
    exchange: &dyn ExchangeApi,
    pair: &str,
) -> Result<MarketSnapshot, CollectorError> {
    let daily = exchange
        .get_candles(pair, CandleInterval::Day, DAILY_CANDLE_COUNT)
        .await
        .map_err(CollectorError::ProviderUnavailable)?;
    if daily.len() < DAILY_CANDLE_COUNT {
        return Err(CollectorError::InsufficientHistory {
            wanted: DAILY_CANDLE_COUNT,
            got: daily.len(),
        });
    }

    let hourly = exchange
        .get_candles(pair, CandleInterval::Hour, HOURLY_CANDLE_COUNT)
        .await
        .map_err(CollectorError::ProviderUnavailable)?;
    if hourly.len() < HOURLY_CANDLE_COUNT {
        return Err(CollectorError::InsufficientHistory {
            wanted: HOURLY_CANDLE_COUNT,
            got: hourly.len(),
        });
    }

    let daily_rows = indicators::compute_indicators(&daily);
    let hourly_rows = indicators::compute_indicators(&hourly);
    let latest = indicators::latest_indicators(&daily_rows);

    let daily_tail = daily_rows[daily_rows.len().saturating_sub(DAILY_TAIL_LEN)..].to_vec();
    let hourly_tail = hourly_rows[hourly_rows.len().saturating_sub(HOURLY_TAIL_LEN)..].to_vec();

    logger::debug(
        LogTag::Collector,
        &format!(
            "market: {} daily + {} hourly rows, latest rsi={:?}",
            daily_tail.len(),
            hourly_tail.len(),
            latest.rsi
        ),
    );

    Ok(MarketSnapshot {
        daily: daily_tail,
        hourly: hourly_tail,
        latest,
    })
}

/// Collect the sentiment index and, when possible, headlines.
///
/// Headline failure degrades to no news; index failure fails the collector.
pub async fn collect_sentiment(
    signals: &dyn SignalApi,
    topic: &str,
) -> Result<(SentimentSnapshot, Option<Vec<NewsItem>>), CollectorError> {
    let history = signals
        .get_sentiment_index(SENTIMENT_WINDOW)
        .await
        .map_err(CollectorError::SignalProviderUnavailable)?;

    let current = history
        .last()
        .cloned()
        .ok_or_else(|| {
            CollectorError::SignalProviderUnavailable("empty sentiment history".to_string())
        })?;

    let average =
        history.iter().map(|e| e.score as f64).sum::<f64>() / history.len() as f64;
    let trend = if (current.score as f64) > average {
        SentimentTrend::Improving
    } else {
        SentimentTrend::Deteriorating
    };

    let snapshot = SentimentSnapshot {
        score: current.score,
        label: current.label,
        history,
        trend,
        average,
    };

    let news = match signals.get_headlines(topic, HEADLINE_LIMIT).await {
        Ok(items) => Some(items),
        Err(e) => {
            logger::warning(
                LogTag::Collector,
                &format!("headlines unavailable, continuing without news: {}", e),
            );
            None
        }
    };

    logger::debug(
        LogTag::Collector,
        &format!(
            "sentiment: score={} avg={:.1} trend={:?} news={}",
            snapshot.score,
            snapshot.average,
            snapshot.trend,
            news.as_ref().map(|n| n.len()).unwrap_or(0)
        ),
    );

    Ok((snapshot, news))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candle, OrderBookLevel, OrderReceipt, SentimentEntry, SentimentLabel};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn candles(count: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| Candle {
                timestamp: start + Duration::hours(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + i as f64,
                volume: 5.0,
            })
            .collect()
    }

    /// Scriptable exchange stub
    struct StubExchange {
        fail_balance: bool,
        daily_count: usize,
        hourly_count: usize,
        book_levels: usize,
    }

    impl Default for StubExchange {
        fn default() -> Self {
            Self {
                fail_balance: false,
                daily_count: DAILY_CANDLE_COUNT,
                hourly_count: HOURLY_CANDLE_COUNT,
                book_levels: 8,
            }
        }
    }

    #[async_trait]
    impl ExchangeApi for StubExchange {
        async fn get_cash_balance(&self) -> Result<f64, String> {
            if self.fail_balance {
                return Err("balance endpoint down".to_string());
            }
            Ok(1_000_000.0)
        }

        async fn get_position_balance(&self, _pair: &str) -> Result<f64, String> {
            Ok(0.5)
        }

        async fn get_average_entry_price(&self, _pair: &str) -> Result<f64, String> {
            Ok(90_000.0)
        }

        async fn get_mark_price(&self, _pair: &str) -> Result<f64, String> {
            Ok(100_000.0)
        }

        async fn get_order_book(&self, _pair: &str) -> Result<OrderBookSnapshot, String> {
            let asks = (0..self.book_levels)
                .map(|i| OrderBookLevel {
                    price: 100_100.0 + i as f64 * 100.0,
                    size: 1.0,
                })
                .collect();
            let bids = (0..self.book_levels)
                .map(|i| OrderBookLevel {
                    price: 100_000.0 - i as f64 * 100.0,
                    size: 1.0,
                })
                .collect();
            Ok(OrderBookSnapshot {
                timestamp: Utc::now(),
                total_ask_volume: 8.0,
                total_bid_volume: 8.0,
                ask_levels: asks,
                bid_levels: bids,
            })
        }

        async fn get_candles(
            &self,
            _pair: &str,
            interval: CandleInterval,
            _count: usize,
        ) -> Result<Vec<Candle>, String> {
            Ok(match interval {
                CandleInterval::Day => candles(self.daily_count),
                CandleInterval::Hour => candles(self.hourly_count),
            })
        }

        async fn submit_market_buy(
            &self,
            _pair: &str,
            _amount_quote: f64,
        ) -> Result<OrderReceipt, String> {
            unreachable!("collectors never place orders")
        }

        async fn submit_market_sell(
            &self,
            _pair: &str,
            _volume_base: f64,
        ) -> Result<OrderReceipt, String> {
            unreachable!("collectors never place orders")
        }
    }

    struct StubSignals {
        scores: Vec<u8>,
        fail_news: bool,
    }

    #[async_trait]
    impl SignalApi for StubSignals {
        async fn get_sentiment_index(
            &self,
            _window: usize,
        ) -> Result<Vec<SentimentEntry>, String> {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(self
                .scores
                .iter()
                .enumerate()
                .map(|(i, &score)| SentimentEntry {
                    date: start + Duration::days(i as i64),
                    score,
                    label: SentimentLabel::Neutral,
                })
                .collect())
        }

        async fn get_headlines(&self, _topic: &str, limit: usize) -> Result<Vec<NewsItem>, String> {
            if self.fail_news {
                return Err("news feed down".to_string());
            }
            Ok((0..limit)
                .map(|i| NewsItem {
                    title: format!("headline {}", i),
                    source: "stub".to_string(),
                    url: "https://example.com".to_string(),
                    published_at: Utc::now(),
                    summary: None,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_account_collector_never_partial() {
        let exchange = StubExchange {
            fail_balance: true,
            ..Default::default()
        };
        let err = collect_account(&exchange, "KRW-BTC").await.unwrap_err();
        assert!(matches!(err, CollectorError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_account_collector_derives_fields() {
        let exchange = StubExchange::default();
        let snap = collect_account(&exchange, "KRW-BTC").await.unwrap();

        assert!((snap.unrealized_pnl - 5_000.0).abs() < 1e-9);
        assert!((snap.total_value - 1_050_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_order_book_truncated_and_sorted() {
        let exchange = StubExchange::default();
        let book = collect_order_book(&exchange, "KRW-BTC").await.unwrap();

        assert_eq!(book.ask_levels.len(), ORDER_BOOK_DEPTH);
        assert_eq!(book.bid_levels.len(), ORDER_BOOK_DEPTH);
        assert!(book
            .ask_levels
            .windows(2)
            .all(|w| w[0].price <= w[1].price));
        assert!(book
            .bid_levels
            .windows(2)
            .all(|w| w[0].price >= w[1].price));
    }

    #[tokio::test]
    async fn test_empty_order_book_is_no_market_data() {
        let exchange = StubExchange {
            book_levels: 0,
            ..Default::default()
        };
        let err = collect_order_book(&exchange, "KRW-BTC").await.unwrap_err();
        assert!(matches!(err, CollectorError::NoMarketData(_)));
    }

    #[tokio::test]
    async fn test_market_collector_tails() {
        let exchange = StubExchange::default();
        let market = collect_market(&exchange, "KRW-BTC").await.unwrap();

        assert_eq!(market.daily.len(), DAILY_TAIL_LEN);
        assert_eq!(market.hourly.len(), HOURLY_TAIL_LEN);
        // 30 daily bars are enough for RSI-14 on the final row
        assert!(market.latest.rsi.is_some());
    }

    #[tokio::test]
    async fn test_market_collector_insufficient_history() {
        let exchange = StubExchange {
            daily_count: 12,
            ..Default::default()
        };
        let err = collect_market(&exchange, "KRW-BTC").await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::InsufficientHistory { wanted: 30, got: 12 }
        ));
    }

    #[tokio::test]
    async fn test_sentiment_trend_improving() {
        let signals = StubSignals {
            scores: vec![40, 45, 50, 55, 60, 65, 70],
            fail_news: false,
        };
        let (snapshot, news) = collect_sentiment(&signals, "BTC").await.unwrap();

        assert_eq!(snapshot.score, 70);
        assert_eq!(snapshot.trend, SentimentTrend::Improving);
        assert!((snapshot.average - 55.0).abs() < 1e-9);
        assert_eq!(news.unwrap().len(), HEADLINE_LIMIT);
    }

    #[tokio::test]
    async fn test_sentiment_trend_deteriorating_and_news_optional() {
        let signals = StubSignals {
            scores: vec![70, 65, 60, 55, 50, 45, 40],
            fail_news: true,
        };
        let (snapshot, news) = collect_sentiment(&signals, "BTC").await.unwrap();

        assert_eq!(snapshot.trend, SentimentTrend::Deteriorating);
        assert!(news.is_none());
    }
}
