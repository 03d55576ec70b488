//! Indicator engine
//!
//! Pure, deterministic batch computation over a candle series. Every indicator
//! reports `None` until its warm-up window is filled; a missing value is never
//! silently zero. The engine has no error conditions: short input simply
//! yields rows with more `None`s.

use crate::types::{Candle, IndicatorRow, LatestIndicators};

pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_WIDTH: f64 = 2.0;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const ATR_PERIOD: usize = 14;
pub const SMA_WINDOWS: [usize; 4] = [5, 20, 60, 120];

/// Compute one indicator row per input candle.
pub fn compute_indicators(candles: &[Candle]) -> Vec<IndicatorRow> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let sma_5 = sma(&closes, SMA_WINDOWS[0]);
    let sma_20 = sma(&closes, SMA_WINDOWS[1]);
    let sma_60 = sma(&closes, SMA_WINDOWS[2]);
    let sma_120 = sma(&closes, SMA_WINDOWS[3]);
    let (bb_high, bb_mid, bb_low, bb_percent) = bollinger(&closes);
    let rsi = rsi_wilder(&closes, RSI_PERIOD);
    let (macd, macd_signal, macd_diff) = macd_lines(&closes);
    let atr = atr_wilder(candles, ATR_PERIOD);

    candles
        .iter()
        .enumerate()
        .map(|(i, c)| IndicatorRow {
            timestamp: c.timestamp,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
            bb_high: bb_high[i],
            bb_mid: bb_mid[i],
            bb_low: bb_low[i],
            bb_percent: bb_percent[i],
            rsi: rsi[i],
            macd: macd[i],
            macd_signal: macd_signal[i],
            macd_diff: macd_diff[i],
            sma_5: sma_5[i],
            sma_20: sma_20[i],
            sma_60: sma_60[i],
            sma_120: sma_120[i],
            atr: atr[i],
        })
        .collect()
}

/// Extract the headline oscillator values from the final row of a series.
pub fn latest_indicators(rows: &[IndicatorRow]) -> LatestIndicators {
    match rows.last() {
        Some(row) => LatestIndicators {
            rsi: row.rsi,
            macd: row.macd,
            macd_signal: row.macd_signal,
            bb_percent: row.bb_percent,
        },
        None => LatestIndicators {
            rsi: None,
            macd: None,
            macd_signal: None,
            bb_percent: None,
        },
    }
}

/// Trailing simple moving average, `None` for the first `window - 1` bars.
fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    let mut running = 0.0;
    for i in 0..values.len() {
        running += values[i];
        if i >= window {
            running -= values[i - window];
        }
        if i + 1 >= window {
            out[i] = Some(running / window as f64);
        }
    }
    out
}

/// Bollinger bands (20, 2.0) and %b.
///
/// %b is undefined when the band width is zero (flat window).
fn bollinger(
    closes: &[f64],
) -> (
    Vec<Option<f64>>,
    Vec<Option<f64>>,
    Vec<Option<f64>>,
    Vec<Option<f64>>,
) {
    let n = closes.len();
    let mid = sma(closes, BOLLINGER_PERIOD);
    let mut high = vec![None; n];
    let mut low = vec![None; n];
    let mut percent = vec![None; n];

    for i in 0..n {
        let Some(mean) = mid[i] else { continue };
        let window = &closes[i + 1 - BOLLINGER_PERIOD..=i];
        let variance =
            window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / BOLLINGER_PERIOD as f64;
        let dev = BOLLINGER_WIDTH * variance.sqrt();

        let band_high = mean + dev;
        let band_low = mean - dev;
        high[i] = Some(band_high);
        low[i] = Some(band_low);

        let width = band_high - band_low;
        if width > 0.0 {
            percent[i] = Some((closes[i] - band_low) / width);
        }
    }

    (high, mid, low, percent)
}

/// RSI with Wilder smoothing, defined from bar `period` onward
/// (the seed average needs `period` price changes).
fn rsi_wilder(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if n <= period {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += -change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..n {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Exponential moving average seeded with the SMA of the first `period`
/// values; `None` before the seed.
fn ema(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    let alpha = 2.0 / (period as f64 + 1.0);

    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;
    let mut prev: Option<f64> = None;

    for i in 0..n {
        let Some(v) = values[i] else { continue };
        match prev {
            Some(p) => {
                let next = alpha * v + (1.0 - alpha) * p;
                out[i] = Some(next);
                prev = Some(next);
            }
            None => {
                seed_sum += v;
                seed_count += 1;
                if seed_count == period {
                    let seeded = seed_sum / period as f64;
                    out[i] = Some(seeded);
                    prev = Some(seeded);
                }
            }
        }
    }
    out
}

/// MACD (12/26), signal (EMA-9 of MACD), and their difference.
fn macd_lines(closes: &[f64]) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let wrapped: Vec<Option<f64>> = closes.iter().map(|&c| Some(c)).collect();
    let fast = ema(&wrapped, MACD_FAST);
    let slow = ema(&wrapped, MACD_SLOW);

    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = ema(&macd, MACD_SIGNAL);
    let diff: Vec<Option<f64>> = macd
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    (macd, signal, diff)
}

/// True range: max(high-low, |high-prev_close|, |low-prev_close|)
fn true_range(candle: &Candle, prev_close: Option<f64>) -> f64 {
    let range = candle.high - candle.low;
    match prev_close {
        Some(prev) => range
            .max((candle.high - prev).abs())
            .max((candle.low - prev).abs()),
        None => range,
    }
}

/// ATR: mean of the first `period` true ranges, Wilder smoothing afterwards.
fn atr_wilder(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let n = candles.len();
    let mut out = vec![None; n];
    if n < period {
        return out;
    }

    let mut trs = Vec::with_capacity(n);
    let mut prev_close = None;
    for c in candles {
        trs.push(true_range(c, prev_close));
        prev_close = Some(c.close);
    }

    let mut atr = trs[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(atr);
    for i in period..n {
        atr = (atr * (period as f64 - 1.0) + trs[i]) / period as f64;
        out[i] = Some(atr);
    }
    out
}
