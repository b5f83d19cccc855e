use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::utils::dates::day_count;

/// Flat fee added to every booking, independent of duration
pub const SERVICE_FEE: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub days: i64,
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}

pub fn calculate_rental_price(
    price_per_day: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> AppResult<PriceQuote> {
    if end_date < start_date {
        return Err(AppError::InvalidRange);
    }

    let days = day_count(start_date, end_date);
    let subtotal = price_per_day * Decimal::from(days);
    let service_fee = Decimal::from(SERVICE_FEE);

    Ok(PriceQuote {
        days,
        subtotal,
        service_fee,
        total: subtotal + service_fee,
    })
}
