//! Money calculation helpers using rust_decimal for precision
//!
//! Amounts are stored as `f64`; every calculation converts to `Decimal`,
//! rounds half-up to 2 decimal places and converts back.

use rust_decimal::prelude::*;

const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal (non-finite values become zero)
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal to f64, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `(price - cost) / price * 100`, zero when price is zero or the result overflows
pub fn profit_margin(price: f64, cost: f64) -> f64 {
    let price = to_decimal(price);
    if price.is_zero() {
        return 0.0;
    }
    price
        .checked_sub(to_decimal(cost))
        .and_then(|profit| profit.checked_div(price))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(to_f64)
        .unwrap_or_default()
}

/// `unit_price * quantity`, zero on overflow
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_decimal(unit_price)
        .checked_mul(Decimal::from(quantity))
        .map(to_f64)
        .unwrap_or_default()
}

/// `(unit_price - unit_cost) * quantity`, zero on overflow
pub fn line_profit(unit_price: f64, unit_cost: f64, quantity: i64) -> f64 {
    to_decimal(unit_price)
        .checked_sub(to_decimal(unit_cost))
        .and_then(|margin| margin.checked_mul(Decimal::from(quantity)))
        .map(to_f64)
        .unwrap_or_default()
}

/// `total / months`, zero when months is zero
pub fn monthly_amount(total: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    to_decimal(total)
        .checked_div(Decimal::from(months))
        .map(to_f64)
        .unwrap_or_default()
}

/// Sum a list of amounts without accumulating float error; saturates on overflow
pub fn sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let total = values
        .into_iter()
        .map(to_decimal)
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v));
    to_f64(total)
}
