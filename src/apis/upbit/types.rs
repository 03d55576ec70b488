/// Upbit API response types
///
/// These types match the Upbit REST v1 API format.
/// API Documentation: https://docs.upbit.com/reference
use serde::Deserialize;

/// One balance entry from GET /v1/accounts
///
/// Upbit returns numeric fields as strings on this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UpbitAccount {
    /// Currency code, e.g. "KRW" or "BTC"
    pub currency: String,

    /// Available balance
    pub balance: String,

    /// Balance locked in open orders
    pub locked: String,

    /// Volume-weighted average buy price
    pub avg_buy_price: String,
}

impl UpbitAccount {
    pub fn balance_f64(&self) -> f64 {
        self.balance.parse().unwrap_or(0.0)
    }

    pub fn avg_buy_price_f64(&self) -> f64 {
        self.avg_buy_price.parse().unwrap_or(0.0)
    }
}

/// One ticker entry from GET /v1/ticker
#[derive(Debug, Clone, Deserialize)]
pub struct UpbitTicker {
    pub market: String,

    /// Last traded price
    pub trade_price: f64,
}

/// Order book response from GET /v1/orderbook
#[derive(Debug, Clone, Deserialize)]
pub struct UpbitOrderBook {
    pub market: String,

    /// Server timestamp in milliseconds
    pub timestamp: i64,

    pub total_ask_size: f64,
    pub total_bid_size: f64,

    /// Levels ordered best-first on both sides
    pub orderbook_units: Vec<UpbitOrderBookUnit>,
}

/// One price level pair (ask + bid at the same depth rank)
#[derive(Debug, Clone, Deserialize)]
pub struct UpbitOrderBookUnit {
    pub ask_price: f64,
    pub bid_price: f64,
    pub ask_size: f64,
    pub bid_size: f64,
}

/// One candle from GET /v1/candles/{days,minutes/60}
///
/// Upbit returns candles most-recent-first; callers reverse into
/// chronological order.
#[derive(Debug, Clone, Deserialize)]
pub struct UpbitCandle {
    pub market: String,

    /// Bar open time, UTC, "%Y-%m-%dT%H:%M:%S"
    pub candle_date_time_utc: String,

    pub opening_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub trade_price: f64,

    /// Accumulated volume in base currency
    pub candle_acc_trade_volume: f64,
}

/// Order acknowledgment from POST /v1/orders
#[derive(Debug, Clone, Deserialize)]
pub struct UpbitOrderResponse {
    pub uuid: String,

    /// "bid" (buy) or "ask" (sell)
    pub side: String,
}
