use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Attributes of one listed product. The product name is the map key one level up
/// and is the only identity a product has.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub url: String,
    #[serde(rename = "img", alias = "image")]
    pub image_url: String,
    pub price: Decimal,
}

/// Product name -> attributes, for one vendor/category pair.
pub type CategoryMap = IndexMap<String, ProductRecord>;

/// Category name -> products.
pub type VendorSnapshot = IndexMap<String, CategoryMap>;

/// Vendor name -> categories. This is what the snapshot store persists.
pub type FullSnapshot = IndexMap<String, VendorSnapshot>;

/// Total number of products across every vendor and category.
pub fn product_count(snapshot: &FullSnapshot) -> usize {
    snapshot
        .values()
        .flat_map(|vendor| vendor.values())
        .map(|category| category.len())
        .sum()
}
