//! Trading cycle
//!
//! One cycle runs to completion before the next begins; there is no overlap,
//! so a decision can never race a stale position. Within the cycle the four
//! collectors have no data dependency on each other and run concurrently,
//! each under its own timeout; the aggregator is the join barrier.

use crate::aggregator;
use crate::analyst;
use crate::apis::llm::LlmClient;
use crate::apis::signals::SignalApi;
use crate::apis::upbit::ExchangeApi;
use crate::collectors;
use crate::config::Config;
use crate::decision::{self, DecisionRecord};
use crate::errors::{CollectorError, CycleError};
use crate::logger::{self, LogTag};
use crate::trader;
use crate::types::OrderReceipt;
use std::time::Duration;
use tokio::time::timeout;

/// Per-collector timeout. A slow provider fails its own snapshot without
/// stalling the cycle barrier indefinitely.
pub const COLLECTOR_TIMEOUT_SECS: u64 = 15;

/// External collaborators for one cycle
pub struct CycleDeps<'a> {
    pub exchange: &'a dyn ExchangeApi,
    pub llm: &'a dyn LlmClient,
    pub signals: &'a dyn SignalApi,
}

/// What a completed cycle produced
#[derive(Debug)]
pub struct CycleOutcome {
    pub decision: DecisionRecord,
    pub receipt: Option<OrderReceipt>,
}

/// Flatten a timed-out or failed collector into an absent snapshot,
/// logging at the boundary. Collector errors never propagate past here.
fn settle<T>(
    name: &str,
    result: Result<Result<T, CollectorError>, tokio::time::error::Elapsed>,
) -> Option<T> {
    match result {
        Ok(Ok(snapshot)) => Some(snapshot),
        Ok(Err(e)) => {
            logger::warning(LogTag::Collector, &format!("{} collector failed: {}", name, e));
            None
        }
        Err(_) => {
            logger::warning(
                LogTag::Collector,
                &format!("{} collector timed out after {}s", name, COLLECTOR_TIMEOUT_SECS),
            );
            None
        }
    }
}

/// Run one full trading cycle: collect, aggregate, ask, parse, dispatch.
pub async fn run_cycle(
    config: &Config,
    deps: &CycleDeps<'_>,
) -> Result<CycleOutcome, CycleError> {
    let pair = config.pair.as_str();
    let per_collector = Duration::from_secs(COLLECTOR_TIMEOUT_SECS);

    logger::info(LogTag::System, &format!("cycle started for {}", pair));

    let (account, order_book, market, sentiment) = tokio::join!(
        timeout(per_collector, collectors::collect_account(deps.exchange, pair)),
        timeout(per_collector, collectors::collect_order_book(deps.exchange, pair)),
        timeout(per_collector, collectors::collect_market(deps.exchange, pair)),
        timeout(
            per_collector,
            collectors::collect_sentiment(deps.signals, config.base_currency()),
        ),
    );

    let account = settle("account", account);
    let order_book = settle("order book", order_book);
    let market = settle("market", market);
    let (sentiment, news) = match settle("sentiment", sentiment) {
        Some((snapshot, news)) => (Some(snapshot), news),
        None => (None, None),
    };

    // Position size is needed again at dispatch time; grab it before the
    // payload takes ownership of the snapshot
    let position_size = account.as_ref().map(|a| a.position_size).unwrap_or(0.0);

    let payload =
        aggregator::build_payload(pair, account, order_book, market, sentiment, news)?;
    logger::info(LogTag::System, "payload assembled, requesting recommendation");

    let raw = analyst::request_recommendation(deps.llm, &config.openai_model, &payload).await?;
    let record = decision::parse_decision(&raw)?;

    let receipt = match trader::dispatch(&record, deps.exchange, pair, position_size).await {
        Ok(receipt) => receipt,
        Err(e) => {
            // The decision stands; only the (stubbed) execution leg failed
            logger::error(LogTag::Trader, &format!("order submission failed: {}", e));
            None
        }
    };

    logger::info(
        LogTag::System,
        &format!("cycle complete: decision={}", record.decision),
    );

    Ok(CycleOutcome {
        decision: record,
        receipt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::llm::{ChatRequest, ChatResponse, LlmError};
    use crate::config;
    use crate::types::{
        Candle, CandleInterval, NewsItem, OrderBookLevel, OrderBookSnapshot, SentimentEntry,
        SentimentLabel,
    };
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> Config {
        Config {
            upbit_access_key: "a".to_string(),
            upbit_secret_key: "s".to_string(),
            openai_api_key: "k".to_string(),
            openai_model: config::DEFAULT_MODEL.to_string(),
            cryptopanic_api_key: None,
            pair: "KRW-BTC".to_string(),
            cycle_interval_secs: 1,
        }
    }

    struct StubExchange {
        fail_order_book: bool,
        buys: AtomicUsize,
        sells: AtomicUsize,
    }

    impl StubExchange {
        fn new(fail_order_book: bool) -> Self {
            Self {
                fail_order_book,
                buys: AtomicUsize::new(0),
                sells: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExchangeApi for StubExchange {
        async fn get_cash_balance(&self) -> Result<f64, String> {
            Ok(500_000.0)
        }
        async fn get_position_balance(&self, _pair: &str) -> Result<f64, String> {
            Ok(0.2)
        }
        async fn get_average_entry_price(&self, _pair: &str) -> Result<f64, String> {
            Ok(95_000.0)
        }
        async fn get_mark_price(&self, _pair: &str) -> Result<f64, String> {
            Ok(100_000.0)
        }

        async fn get_order_book(&self, pair: &str) -> Result<OrderBookSnapshot, String> {
            if self.fail_order_book {
                return Err(format!("orderbook endpoint down for {}", pair));
            }
            Ok(OrderBookSnapshot {
                timestamp: Utc::now(),
                total_ask_volume: 2.0,
                total_bid_volume: 2.0,
                ask_levels: vec![OrderBookLevel {
                    price: 100_100.0,
                    size: 1.0,
                }],
                bid_levels: vec![OrderBookLevel {
                    price: 100_000.0,
                    size: 1.0,
                }],
            })
        }

        async fn get_candles(
            &self,
            _pair: &str,
            interval: CandleInterval,
            count: usize,
        ) -> Result<Vec<Candle>, String> {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let step = match interval {
                CandleInterval::Day => ChronoDuration::days(1),
                CandleInterval::Hour => ChronoDuration::hours(1),
            };
            Ok((0..count)
                .map(|i| Candle {
                    timestamp: start + step * i as i32,
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0,
                    volume: 1.0,
                })
                .collect())
        }

        async fn submit_market_buy(
            &self,
            _pair: &str,
            _amount_quote: f64,
        ) -> Result<crate::types::OrderReceipt, String> {
            self.buys.fetch_add(1, Ordering::SeqCst);
            Ok(crate::types::OrderReceipt {
                uuid: "b".to_string(),
                side: "bid".to_string(),
            })
        }

        async fn submit_market_sell(
            &self,
            _pair: &str,
            _volume_base: f64,
        ) -> Result<crate::types::OrderReceipt, String> {
            self.sells.fetch_add(1, Ordering::SeqCst);
            Ok(crate::types::OrderReceipt {
                uuid: "s".to_string(),
                side: "ask".to_string(),
            })
        }
    }

    struct StubLlm {
        reply: String,
        calls: AtomicUsize,
    }

    impl StubLlm {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatResponse {
                content: self.reply.clone(),
                finish_reason: "stop".to_string(),
                model: "test".to_string(),
            })
        }
    }

    struct StubSignals;

    #[async_trait]
    impl SignalApi for StubSignals {
        async fn get_sentiment_index(
            &self,
            window: usize,
        ) -> Result<Vec<SentimentEntry>, String> {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok((0..window)
                .map(|i| SentimentEntry {
                    date: start + ChronoDuration::days(i as i64),
                    score: 50,
                    label: SentimentLabel::Neutral,
                })
                .collect())
        }

        async fn get_headlines(
            &self,
            _topic: &str,
            _limit: usize,
        ) -> Result<Vec<NewsItem>, String> {
            Err("no headlines in tests".to_string())
        }
    }

    #[tokio::test]
    async fn test_order_book_failure_never_reaches_llm() {
        let exchange = StubExchange::new(true);
        let llm = StubLlm::new("{}");
        let deps = CycleDeps {
            exchange: &exchange,
            llm: &llm,
            signals: &StubSignals,
        };

        let err = run_cycle(&test_config(), &deps).await.unwrap_err();

        assert!(matches!(err, CycleError::MissingSnapshot("order book")));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert_eq!(exchange.buys.load(Ordering::SeqCst), 0);
        assert_eq!(exchange.sells.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_cycle_dispatches_buy() {
        let exchange = StubExchange::new(false);
        let llm = StubLlm::new(
            "{\"decision\":\"buy\",\"reason\":\"momentum\",\"risk_level\":\"low\",\"confidence_score\":70}",
        );
        let deps = CycleDeps {
            exchange: &exchange,
            llm: &llm,
            signals: &StubSignals,
        };

        let outcome = run_cycle(&test_config(), &deps).await.unwrap();

        assert_eq!(outcome.decision.decision, crate::decision::TradeAction::Buy);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(exchange.buys.load(Ordering::SeqCst), 1);
        assert_eq!(exchange.sells.load(Ordering::SeqCst), 0);
        assert!(outcome.receipt.is_some());
    }

    #[tokio::test]
    async fn test_unparsable_response_dispatches_nothing() {
        let exchange = StubExchange::new(false);
        let llm = StubLlm::new("I cannot decide.");
        let deps = CycleDeps {
            exchange: &exchange,
            llm: &llm,
            signals: &StubSignals,
        };

        let err = run_cycle(&test_config(), &deps).await.unwrap_err();

        assert!(matches!(err, CycleError::Unparsable(_)));
        assert_eq!(exchange.buys.load(Ordering::SeqCst), 0);
        assert_eq!(exchange.sells.load(Ordering::SeqCst), 0);
    }
}
