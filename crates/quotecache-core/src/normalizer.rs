//! Bars-to-quote normalization.

use rust_decimal::Decimal;

use crate::{DailyBar, MarketSegment, Quote, QuoteError, Symbol, UtcDateTime};

/// Builds a [`Quote`] from ascending bars.
///
/// The latest bar supplies price and OHLCV; change metrics compare it with
/// the bar before it. With a single bar the previous close is the latest
/// close, so change and change rate are both zero.
///
/// # Errors
///
/// Returns [`QuoteError::NotFound`] when `bars` is empty.
pub fn normalize(
    symbol: &Symbol,
    segment: MarketSegment,
    bars: &[DailyBar],
    name: impl Into<String>,
) -> Result<Quote, QuoteError> {
    let Some(latest) = bars.last() else {
        return Err(QuoteError::not_found(symbol.as_str()));
    };
    let previous = match bars.len() {
        0 | 1 => latest,
        len => &bars[len - 2],
    };

    let change = latest.close - previous.close;

    Ok(Quote {
        symbol: symbol.clone(),
        name: name.into(),
        date: latest.date,
        price: latest.close,
        open: latest.open,
        high: latest.high,
        low: latest.low,
        volume: latest.volume,
        change,
        change_rate: change_rate(change, previous.close),
        previous_close: previous.close,
        segment,
        timestamp: UtcDateTime::now(),
    })
}

/// Percentage change against `previous_close`, zero when it is zero.
pub fn change_rate(change: Decimal, previous_close: Decimal) -> Decimal {
    if previous_close.is_zero() {
        return Decimal::ZERO;
    }
    change
        .checked_div(previous_close)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
