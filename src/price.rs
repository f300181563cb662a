use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::utils::error::{AppError, Result};

// Optional currency code letters followed by one symbol, e.g. "$", "US$", "A$", "€".
static CURRENCY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{0,3}[\$£€¥₹]\s*").expect("valid currency regex"));

/// Parse a listing price such as `"$24.99"` or `"$1,299.00"`.
pub fn parse_price(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    let amount = CURRENCY_PREFIX.replace(trimmed, "").replace(',', "");

    Decimal::from_str(amount.trim()).map_err(|_| AppError::PriceFormat {
        input: text.to_string(),
    })
}

/// Display form with exactly two decimals: `"$19.99"`, `"$5.00"`. Half cents round up.
pub fn format_price(price: Decimal, symbol: &str) -> String {
    format!(
        "{}{:.2}",
        symbol,
        price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
