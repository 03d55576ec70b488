/// Upbit exchange client (raw HTTP via reqwest)
///
/// Market Data & Execution Provider for the pipeline. Quote endpoints
/// (ticker, order book, candles) are public; account and order endpoints are
/// signed with an HS256 JWT carrying a SHA-512 hash of the query string.
///
/// API Documentation: https://docs.upbit.com/reference
///
/// Endpoints:
/// - GET  https://api.upbit.com/v1/accounts
/// - GET  https://api.upbit.com/v1/ticker
/// - GET  https://api.upbit.com/v1/orderbook
/// - GET  https://api.upbit.com/v1/candles/days
/// - GET  https://api.upbit.com/v1/candles/minutes/60
/// - POST https://api.upbit.com/v1/orders
pub mod types;

pub use self::types::{
    UpbitAccount, UpbitCandle, UpbitOrderBook, UpbitOrderBookUnit, UpbitOrderResponse, UpbitTicker,
};

use crate::apis::client::HttpClient;
use crate::logger::{self, LogTag};
use crate::types::{
    Candle, CandleInterval, OrderBookLevel, OrderBookSnapshot, OrderReceipt, ORDER_BOOK_DEPTH,
};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{NaiveDateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use uuid::Uuid;

// ============================================================================
// API CONFIGURATION
// ============================================================================

const UPBIT_BASE_URL: &str = "https://api.upbit.com";
const ENDPOINT_ACCOUNTS: &str = "/v1/accounts";
const ENDPOINT_TICKER: &str = "/v1/ticker";
const ENDPOINT_ORDERBOOK: &str = "/v1/orderbook";
const ENDPOINT_CANDLES_DAYS: &str = "/v1/candles/days";
const ENDPOINT_CANDLES_HOURS: &str = "/v1/candles/minutes/60";
const ENDPOINT_ORDERS: &str = "/v1/orders";
const TIMEOUT_SECS: u64 = 10;

/// Cash is always held in KRW on Upbit spot accounts
const CASH_CURRENCY: &str = "KRW";

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Market Data & Execution Provider interface.
///
/// Collectors and the dispatcher depend on this trait, never on the concrete
/// client, so tests can substitute mocks with call counters.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn get_cash_balance(&self) -> Result<f64, String>;
    async fn get_position_balance(&self, pair: &str) -> Result<f64, String>;
    async fn get_average_entry_price(&self, pair: &str) -> Result<f64, String>;
    async fn get_mark_price(&self, pair: &str) -> Result<f64, String>;
    async fn get_order_book(&self, pair: &str) -> Result<OrderBookSnapshot, String>;
    async fn get_candles(
        &self,
        pair: &str,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Candle>, String>;

    /// Market buy spending `amount_quote` of the quote currency
    async fn submit_market_buy(&self, pair: &str, amount_quote: f64)
        -> Result<OrderReceipt, String>;

    /// Market sell of `volume_base` units of the base currency
    async fn submit_market_sell(&self, pair: &str, volume_base: f64)
        -> Result<OrderReceipt, String>;
}

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

/// Upbit REST client
pub struct UpbitClient {
    access_key: String,
    secret_key: String,
    http: HttpClient,
}

impl UpbitClient {
    pub fn new(access_key: String, secret_key: String) -> Result<Self, String> {
        if access_key.trim().is_empty() || secret_key.trim().is_empty() {
            return Err("Upbit API key pair cannot be empty".to_string());
        }

        Ok(Self {
            access_key,
            secret_key,
            http: HttpClient::new(TIMEOUT_SECS)?,
        })
    }

    /// Build the HS256 JWT for a private endpoint.
    ///
    /// When `query` is present its SHA-512 hex digest is embedded so the
    /// server can verify the parameters were not tampered with.
    fn auth_token(&self, query: Option<&str>) -> Result<String, String> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);

        let mut claims = serde_json::Map::new();
        claims.insert(
            "access_key".to_string(),
            serde_json::Value::String(self.access_key.clone()),
        );
        claims.insert(
            "nonce".to_string(),
            serde_json::Value::String(Uuid::new_v4().to_string()),
        );
        if let Some(query) = query {
            let digest = Sha512::digest(query.as_bytes());
            claims.insert(
                "query_hash".to_string(),
                serde_json::Value::String(hex::encode(digest)),
            );
            claims.insert(
                "query_hash_alg".to_string(),
                serde_json::Value::String("SHA512".to_string()),
            );
        }

        let payload = serde_json::to_vec(&claims)
            .map_err(|e| format!("Failed to encode JWT claims: {}", e))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let signing_input = format!("{}.{}", header, payload);
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| format!("Invalid secret key: {}", e))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("Bearer {}.{}", signing_input, signature))
    }

    /// GET /v1/accounts (signed)
    async fn fetch_accounts(&self) -> Result<Vec<UpbitAccount>, String> {
        let token = self.auth_token(None)?;
        let url = format!("{}{}", UPBIT_BASE_URL, ENDPOINT_ACCOUNTS);

        logger::debug(LogTag::Api, "[UPBIT] GET /v1/accounts");

        let response = self
            .http
            .client()
            .get(&url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(|e| format!("Accounts request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Accounts request returned {}: {}", status, body));
        }

        response
            .json::<Vec<UpbitAccount>>()
            .await
            .map_err(|e| format!("Failed to decode accounts response: {}", e))
    }

    /// Find one balance entry by currency code
    async fn account_for(&self, currency: &str) -> Result<Option<UpbitAccount>, String> {
        let accounts = self.fetch_accounts().await?;
        Ok(accounts.into_iter().find(|a| a.currency == currency))
    }

    fn base_currency(pair: &str) -> String {
        pair.split('-').nth(1).unwrap_or(pair).to_string()
    }
}

#[async_trait]
impl ExchangeApi for UpbitClient {
    async fn get_cash_balance(&self) -> Result<f64, String> {
        Ok(self
            .account_for(CASH_CURRENCY)
            .await?
            .map(|a| a.balance_f64())
            .unwrap_or(0.0))
    }

    async fn get_position_balance(&self, pair: &str) -> Result<f64, String> {
        let currency = Self::base_currency(pair);
        Ok(self
            .account_for(&currency)
            .await?
            .map(|a| a.balance_f64())
            .unwrap_or(0.0))
    }

    async fn get_average_entry_price(&self, pair: &str) -> Result<f64, String> {
        let currency = Self::base_currency(pair);
        Ok(self
            .account_for(&currency)
            .await?
            .map(|a| a.avg_buy_price_f64())
            .unwrap_or(0.0))
    }

    async fn get_mark_price(&self, pair: &str) -> Result<f64, String> {
        let url = format!("{}{}", UPBIT_BASE_URL, ENDPOINT_TICKER);

        logger::debug(LogTag::Api, &format!("[UPBIT] GET /v1/ticker {}", pair));

        let response = self
            .http
            .client()
            .get(&url)
            .query(&[("markets", pair)])
            .send()
            .await
            .map_err(|e| format!("Ticker request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Ticker request returned {}: {}", status, body));
        }

        let tickers = response
            .json::<Vec<UpbitTicker>>()
            .await
            .map_err(|e| format!("Failed to decode ticker response: {}", e))?;

        tickers
            .first()
            .map(|t| t.trade_price)
            .ok_or_else(|| format!("Empty ticker response for {}", pair))
    }

    async fn get_order_book(&self, pair: &str) -> Result<OrderBookSnapshot, String> {
        let url = format!("{}{}", UPBIT_BASE_URL, ENDPOINT_ORDERBOOK);

        logger::debug(LogTag::Api, &format!("[UPBIT] GET /v1/orderbook {}", pair));

        let response = self
            .http
            .client()
            .get(&url)
            .query(&[("markets", pair)])
            .send()
            .await
            .map_err(|e| format!("Orderbook request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Orderbook request returned {}: {}", status, body));
        }

        let books = response
            .json::<Vec<UpbitOrderBook>>()
            .await
            .map_err(|e| format!("Failed to decode orderbook response: {}", e))?;

        let book = books
            .into_iter()
            .next()
            .ok_or_else(|| format!("Empty orderbook response for {}", pair))?;

        let timestamp = Utc
            .timestamp_millis_opt(book.timestamp)
            .single()
            .unwrap_or_else(Utc::now);

        // Upbit returns levels best-first, which is exactly the
        // proximity-to-mid order the snapshot requires
        let ask_levels = book
            .orderbook_units
            .iter()
            .take(ORDER_BOOK_DEPTH)
            .map(|u| OrderBookLevel {
                price: u.ask_price,
                size: u.ask_size,
            })
            .collect();
        let bid_levels = book
            .orderbook_units
            .iter()
            .take(ORDER_BOOK_DEPTH)
            .map(|u| OrderBookLevel {
                price: u.bid_price,
                size: u.bid_size,
            })
            .collect();

        Ok(OrderBookSnapshot {
            timestamp,
            total_ask_volume: book.total_ask_size,
            total_bid_volume: book.total_bid_size,
            ask_levels,
            bid_levels,
        })
    }

    async fn get_candles(
        &self,
        pair: &str,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Candle>, String> {
        let endpoint = match interval {
            CandleInterval::Day => ENDPOINT_CANDLES_DAYS,
            CandleInterval::Hour => ENDPOINT_CANDLES_HOURS,
        };
        let url = format!("{}{}", UPBIT_BASE_URL, endpoint);

        logger::debug(
            LogTag::Api,
            &format!("[UPBIT] GET {} {} count={}", endpoint, pair, count),
        );

        let response = self
            .http
            .client()
            .get(&url)
            .query(&[("market", pair), ("count", &count.to_string())])
            .send()
            .await
            .map_err(|e| format!("Candle request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Candle request returned {}: {}", status, body));
        }

        let mut raw = response
            .json::<Vec<UpbitCandle>>()
            .await
            .map_err(|e| format!("Failed to decode candle response: {}", e))?;

        // Most-recent-first on the wire; flip into chronological order
        raw.reverse();

        raw.into_iter()
            .map(|c| {
                let naive =
                    NaiveDateTime::parse_from_str(&c.candle_date_time_utc, "%Y-%m-%dT%H:%M:%S")
                        .map_err(|e| {
                            format!("Bad candle timestamp {}: {}", c.candle_date_time_utc, e)
                        })?;
                Ok(Candle {
                    timestamp: naive.and_utc(),
                    open: c.opening_price,
                    high: c.high_price,
                    low: c.low_price,
                    close: c.trade_price,
                    volume: c.candle_acc_trade_volume,
                })
            })
            .collect()
    }

    async fn submit_market_buy(
        &self,
        pair: &str,
        amount_quote: f64,
    ) -> Result<OrderReceipt, String> {
        self.submit_order(pair, "bid", "price", amount_quote).await
    }

    async fn submit_market_sell(
        &self,
        pair: &str,
        volume_base: f64,
    ) -> Result<OrderReceipt, String> {
        self.submit_order(pair, "ask", "market", volume_base).await
    }
}

impl UpbitClient {
    /// POST /v1/orders (signed over the parameter string)
    ///
    /// Market buys are priced in quote currency (`ord_type=price`), market
    /// sells in base volume (`ord_type=market`), per the Upbit order model.
    async fn submit_order(
        &self,
        pair: &str,
        side: &str,
        ord_type: &str,
        amount: f64,
    ) -> Result<OrderReceipt, String> {
        let amount_field = if ord_type == "price" { "price" } else { "volume" };
        let query = format!(
            "market={}&ord_type={}&{}={}&side={}",
            pair, ord_type, amount_field, amount, side
        );
        let token = self.auth_token(Some(&query))?;
        let url = format!("{}{}", UPBIT_BASE_URL, ENDPOINT_ORDERS);

        let mut body = serde_json::Map::new();
        body.insert("market".to_string(), serde_json::Value::String(pair.to_string()));
        body.insert("side".to_string(), serde_json::Value::String(side.to_string()));
        body.insert(
            "ord_type".to_string(),
            serde_json::Value::String(ord_type.to_string()),
        );
        body.insert(
            amount_field.to_string(),
            serde_json::Value::String(amount.to_string()),
        );

        logger::debug(
            LogTag::Api,
            &format!("[UPBIT] POST /v1/orders {} {} {}", pair, side, ord_type),
        );

        let response = self
            .http
            .client()
            .post(&url)
            .header("Authorization", token)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Order request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Order request returned {}: {}", status, body));
        }

        let order = response
            .json::<UpbitOrderResponse>()
            .await
            .map_err(|e| format!("Failed to decode order response: {}", e))?;

        Ok(OrderReceipt {
            uuid: order.uuid,
            side: order.side,
        })
    }
}
