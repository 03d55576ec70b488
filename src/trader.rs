/// Trade dispatcher
///
/// Routes a validated DecisionRecord to exactly one of market-buy,
/// market-sell, or no-op on the execution provider, exactly once. Position
/// sizing is not implemented; orders go out with a fixed notional
/// placeholder until a real sizing policy exists.
use crate::apis::upbit::ExchangeApi;
use crate::decision::{DecisionRecord, TradeAction};
use crate::logger::{self, LogTag};
use crate::types::OrderReceipt;

/// Placeholder notional for market buys, in quote currency (KRW)
pub const FIXED_ORDER_KRW: f64 = 100_000.0;

/// Execute the routing contract for one decision.
///
/// `position_size` is the base-currency balance from this cycle's account
/// snapshot; market sells liquidate it entirely.
pub async fn dispatch(
    record: &DecisionRecord,
    exchange: &dyn ExchangeApi,
    pair: &str,
    position_size: f64,
) -> Result<Option<OrderReceipt>, String> {
    logger::info(
        LogTag::Trader,
        &format!(
            "decision={} risk={:?} confidence={} | {}",
            record.decision, record.risk_level, record.confidence_score, record.reason
        ),
    );

    match record.decision {
        TradeAction::Buy => {
            logger::info(
                LogTag::Trader,
                &format!(
                    "submitting market buy: {} for {:.0} KRW (fixed placeholder size)",
                    pair, FIXED_ORDER_KRW
                ),
            );
            let receipt = exchange.submit_market_buy(pair, FIXED_ORDER_KRW).await?;
            logger::info(
                LogTag::Trader,
                &format!("buy accepted: uuid={} side={}", receipt.uuid, receipt.side),
            );
            Ok(Some(receipt))
        }
        TradeAction::Sell => {
            logger::info(
                LogTag::Trader,
                &format!(
                    "submitting market sell: {} volume={:.8}",
                    pair, position_size
                ),
            );
            let receipt = exchange.submit_market_sell(pair, position_size).await?;
            logger::info(
                LogTag::Trader,
                &format!("sell accepted: uuid={} side={}", receipt.uuid, receipt.side),
            );
            Ok(Some(receipt))
        }
        TradeAction::Hold => {
            logger::info(LogTag::Trader, "holding, no order submitted");
            Ok(None)
        }
    }
}
