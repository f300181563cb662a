use crate::models::DeltaRecord;
use crate::plugins::traits::{Embed, EmbedImage, MessagePayload};
use crate::price::format_price;

/// `[vendor] product-name`
pub fn embed_title(delta: &DeltaRecord) -> String {
    format!("[{}] {}", delta.vendor, delta.title)
}

pub fn format_delta(delta: &DeltaRecord, currency_symbol: &str) -> Embed {
    Embed {
        title: embed_title(delta),
        description: format_price(delta.price, currency_symbol),
        url: delta.url.clone(),
        image: EmbedImage {
            url: delta.image.clone(),
        },
    }
}

/// One message holding one embed per delta, in delta order.
pub fn format_deltas(deltas: &[DeltaRecord], currency_symbol: &str, content: Option<&str>) -> MessagePayload {
    MessagePayload {
        content: content.map(str::to_string),
        embeds: deltas
            .iter()
            .map(|delta| format_delta(delta, currency_symbol))
            .collect(),
    }
}
