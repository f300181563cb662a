use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{CategoryMap, ProductRecord, TemplateKind};
use crate::price::parse_price;
use crate::utils::error::{AppError, Result};

/// The stock label a storefront item must carry to be listed.
pub const IN_STOCK_LABEL: &str = "In stock";

/// Turn one listing page into a product map, picking the template from the URL.
pub fn extract(page_markup: &[u8], source_url: &str) -> Result<CategoryMap> {
    let kind = TemplateKind::classify(source_url).ok_or_else(|| AppError::Parse {
        message: format!("No known listing template for {}", source_url),
    })?;
    let base = Url::parse(source_url).map_err(|e| AppError::Parse {
        message: format!("Invalid source URL '{}': {}", source_url, e),
    })?;

    let html = String::from_utf8_lossy(page_markup);
    let document = Html::parse_document(&html);

    let products = match kind {
        TemplateKind::ProShop => extract_proshop(&document, &base)?,
        TemplateKind::Storefront => extract_storefront(&document, &base)?,
    };

    tracing::debug!("Extracted {} products from {} ({})", products.len(), source_url, kind);
    Ok(products)
}

fn extract_proshop(document: &Html, base: &Url) -> Result<CategoryMap> {
    let product_selector = selector("li.product")?;
    let title_selector = selector("h3.card-title a")?;
    let image_selector = selector("img")?;
    let price_selector = selector(".price--withoutTax")?;

    let entries = select_entries(document, &product_selector)?;
    let mut products = CategoryMap::new();

    for entry in entries {
        let Some(title) = entry.select(&title_selector).next() else {
            tracing::warn!("Skipping product card without a title link");
            continue;
        };
        let name = raw_text(&title);
        let Some(href) = title.value().attr("href") else {
            tracing::warn!("Skipping '{}': title has no href", name);
            continue;
        };
        let Some(image) = entry
            .select(&image_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
        else {
            tracing::warn!("Skipping '{}': no image", name);
            continue;
        };
        let Some(price_text) = entry.select(&price_selector).next().map(|p| element_text(&p)) else {
            tracing::warn!("Skipping '{}': no price", name);
            continue;
        };

        insert_product(&mut products, name, base, href, image, &price_text);
    }

    Ok(products)
}

fn extract_storefront(document: &Html, base: &Url) -> Result<CategoryMap> {
    let product_selector = selector("div.product-item")?;
    let info_selector = selector(".product-item__info")?;
    let title_selector = selector("span.product-item__title")?;
    let stock_selector = selector(".product-item__inventory")?;
    let link_selector = selector("a[href]")?;
    let image_selector = selector("img[data-src]")?;
    let price_selector = selector(r#"meta[itemprop="price"]"#)?;

    // Relative links on these pages hang off the shop root, not the collection path.
    let origin = Url::parse(&base.origin().ascii_serialization()).map_err(|e| AppError::Parse {
        message: format!("Cannot derive origin of {}: {}", base, e),
    })?;

    let entries = select_entries(document, &product_selector)?;
    let mut products = CategoryMap::new();

    for entry in entries {
        let Some(info) = entry.select(&info_selector).next() else {
            tracing::warn!("Skipping product item without an info block");
            continue;
        };
        let Some(name) = info.select(&title_selector).next().map(|t| raw_text(&t)) else {
            tracing::warn!("Skipping product item without a title");
            continue;
        };

        let in_stock = info
            .select(&stock_selector)
            .next()
            .is_some_and(|label| element_text(&label) == IN_STOCK_LABEL);
        if !in_stock {
            tracing::trace!("'{}' is not in stock", name);
            continue;
        }

        let Some(href) = entry
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            tracing::warn!("Skipping '{}': no product link", name);
            continue;
        };
        let Some(image) = entry
            .select(&image_selector)
            .next()
            .and_then(|img| img.value().attr("data-src"))
        else {
            tracing::warn!("Skipping '{}': no lazy-load image", name);
            continue;
        };
        let Some(price_text) = entry
            .select(&price_selector)
            .next()
            .and_then(|meta| meta.value().attr("content"))
        else {
            tracing::warn!("Skipping '{}': no price metadata", name);
            continue;
        };

        insert_product(&mut products, name, &origin, href, image, price_text);
    }

    Ok(products)
}

fn insert_product(
    products: &mut CategoryMap,
    name: String,
    base: &Url,
    href: &str,
    image: &str,
    price_text: &str,
) {
    let price = match parse_price(price_text) {
        Ok(price) => price,
        Err(e) => {
            tracing::warn!("Skipping '{}': {}", name, e);
            return;
        }
    };

    let record = ProductRecord {
        url: resolve(base, href),
        image_url: resolve(base, image),
        price,
    };

    // Names are the identity key; a repeated name on one page keeps the last entry.
    if products.insert(name.clone(), record).is_some() {
        tracing::debug!("Duplicate product name '{}' on page, keeping the last one", name);
    }
}

fn select_entries<'a>(document: &'a Html, product_selector: &Selector) -> Result<Vec<ElementRef<'a>>> {
    let entries: Vec<ElementRef> = document.select(product_selector).collect();
    if entries.is_empty() {
        return Err(AppError::Parse {
            message: "No product entries found, the page template may have changed".to_string(),
        });
    }
    Ok(entries)
}

fn resolve(base: &Url, reference: &str) -> String {
    base.join(reference)
        .map(String::from)
        .unwrap_or_else(|_| reference.to_string())
}

/// Text exactly as it appears in the markup. Product names keep any padding so keys
/// match snapshots written by earlier deployments.
fn raw_text(element: &ElementRef) -> String {
    element.text().collect()
}

fn element_text(element: &ElementRef) -> String {
    raw_text(element).trim().to_string()
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Parse {
        message: format!("Invalid CSS selector '{}': {:?}", css, e),
    })
}
