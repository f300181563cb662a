use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product seen in the latest fetch but not in the stored snapshot for the same
/// vendor and category. Lives for one run only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaRecord {
    pub vendor: String,
    pub category: String,
    pub title: String,
    pub image: String,
    pub price: Decimal,
    pub url: String,
}
