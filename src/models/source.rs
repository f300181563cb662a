use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::error::{AppError, Result};

/// Listing page markups this crate knows how to read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// BigCommerce-style pro shop: `li.product` cards with display-text prices.
    ProShop,
    /// Storefront collections: `div.product-item` cards with stock labels,
    /// lazy-loaded images and machine-readable prices.
    Storefront,
}

impl TemplateKind {
    /// Pick the template for a listing URL, or `None` if it matches no known platform.
    pub fn classify(source_url: &str) -> Option<Self> {
        let url = Url::parse(source_url).ok()?;
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

        if host.contains("proshop.") {
            Some(TemplateKind::ProShop)
        } else if url.path().contains("/collections/") {
            Some(TemplateKind::Storefront)
        } else {
            None
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::ProShop => write!(f, "proshop"),
            TemplateKind::Storefront => write!(f, "storefront"),
        }
    }
}

/// Vendor -> category -> listing URL, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SourceConfig {
    vendors: IndexMap<String, IndexMap<String, String>>,
}

impl SourceConfig {
    pub fn new(vendors: IndexMap<String, IndexMap<String, String>>) -> Self {
        Self { vendors }
    }

    /// Read the TOML source file. A missing file is an empty config.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("No source config at {}, nothing to fetch", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::SourceConfig {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        let config = Self::from_toml(&text).map_err(|message| AppError::SourceConfig {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!(
            "Loaded {} sources for {} vendors from {}",
            config.source_count(),
            config.vendors.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, String> {
        let config: SourceConfig = toml::from_str(text).map_err(|e| e.to_string())?;

        for (vendor, categories) in &config.vendors {
            for (category, url) in categories {
                if Url::parse(url).is_err() {
                    return Err(format!("Invalid URL for {}/{}: {}", vendor, category, url));
                }
            }
        }

        Ok(config)
    }

    /// `(vendor, category, url)` triples in file order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.vendors.iter().flat_map(|(vendor, categories)| {
            categories
                .iter()
                .map(move |(category, url)| (vendor.as_str(), category.as_str(), url.as_str()))
        })
    }

    pub fn source_count(&self) -> usize {
        self.vendors.values().map(|categories| categories.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.source_count() == 0
    }
}
