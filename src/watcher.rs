use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::diff::diff;
use crate::extractor::extract;
use crate::models::{product_count, CategoryMap, DeltaRecord, FullSnapshot, SourceConfig};
use crate::plugins::formatter::format_deltas;
use crate::plugins::notifiers::DiscordNotifier;
use crate::plugins::traits::NotifierPlugin;
use crate::scraper::{HttpFetcher, PageFetcher};
use crate::snapshot_store::SnapshotStore;
use crate::utils::error::Result;

/// What happened to the notification step of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// No stored snapshot to compare against.
    SkippedColdStart,
    /// Channel or token not configured.
    SkippedNoCredentials,
    NothingNew,
    Sent { messages: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub sources_checked: usize,
    pub sources_failed: usize,
    pub products_seen: usize,
    pub deltas: Vec<DeltaRecord>,
    pub dispatch: DispatchOutcome,
    pub total_time_ms: u64,
}

/// Drives one watch run: load, fetch, diff, announce, persist.
pub struct Watcher {
    store: SnapshotStore,
    sources_path: PathBuf,
    fetcher: Box<dyn PageFetcher>,
    notifier: Option<Box<dyn NotifierPlugin>>,
    currency_symbol: String,
    content: Option<String>,
}

impl Watcher {
    pub fn new(
        store: SnapshotStore,
        sources_path: impl Into<PathBuf>,
        fetcher: Box<dyn PageFetcher>,
        notifier: Option<Box<dyn NotifierPlugin>>,
    ) -> Self {
        Self {
            store,
            sources_path: sources_path.into(),
            fetcher,
            notifier,
            currency_symbol: "$".to_string(),
            content: None,
        }
    }

    /// Wire up the HTTP fetcher and, when credentials are present, the Discord notifier.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.scraper)?;
        let notifier = DiscordNotifier::from_config(&config.notifications.discord)?
            .map(|n| Box::new(n) as Box<dyn NotifierPlugin>);

        Ok(Self::new(
            SnapshotStore::new(&config.storage.snapshot_path),
            &config.storage.sources_path,
            Box::new(fetcher),
            notifier,
        )
        .with_formatting(
            &config.notifications.currency_symbol,
            config.notifications.discord.content.as_deref(),
        ))
    }

    pub fn with_formatting(mut self, currency_symbol: &str, content: Option<&str>) -> Self {
        self.currency_symbol = currency_symbol.to_string();
        self.content = content.map(str::to_string);
        self
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        let previous = self.store.load().await?;
        let sources = SourceConfig::load(&self.sources_path).await?;
        tracing::info!(
            "Checking {} sources ({} products known)",
            sources.source_count(),
            product_count(&previous)
        );

        let (current, sources_failed) = self.fetch_all(&sources).await;

        let deltas = diff(&previous, &current);
        tracing::info!("Found {} new products", deltas.len());

        let dispatch = self.dispatch(previous.is_empty(), &deltas).await;

        // Written even when dispatch failed, so the same products are not announced twice.
        self.store.save(&current).await?;

        let summary = RunSummary {
            started_at,
            sources_checked: sources.source_count(),
            sources_failed,
            products_seen: product_count(&current),
            deltas,
            dispatch,
            total_time_ms: start_time.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Run finished: {} sources ({} failed), {} products, {} new, dispatch {:?}, {} ms",
            summary.sources_checked,
            summary.sources_failed,
            summary.products_seen,
            summary.deltas.len(),
            summary.dispatch,
            summary.total_time_ms
        );
        Ok(summary)
    }

    /// Fetch every configured category in order. A failed category is recorded as empty.
    async fn fetch_all(&self, sources: &SourceConfig) -> (FullSnapshot, usize) {
        let mut snapshot = FullSnapshot::new();
        let mut failed = 0;

        for (vendor, category, url) in sources.sources() {
            let products = match self.fetch_category(url).await {
                Ok(products) => products,
                Err(e) => {
                    tracing::warn!("{}/{} degraded to empty: {}", vendor, category, e);
                    failed += 1;
                    CategoryMap::new()
                }
            };

            snapshot
                .entry(vendor.to_string())
                .or_default()
                .insert(category.to_string(), products);
        }

        (snapshot, failed)
    }

    async fn fetch_category(&self, url: &str) -> Result<CategoryMap> {
        let page = self.fetcher.fetch(url).await?;
        extract(&page, url)
    }

    async fn dispatch(&self, cold_start: bool, deltas: &[DeltaRecord]) -> DispatchOutcome {
        if cold_start {
            tracing::info!("No previous snapshot, skipping notifications this run");
            return DispatchOutcome::SkippedColdStart;
        }
        let Some(notifier) = &self.notifier else {
            tracing::info!("Notification channel not configured, skipping notifications");
            return DispatchOutcome::SkippedNoCredentials;
        };
        if deltas.is_empty() {
            return DispatchOutcome::NothingNew;
        }

        let payload = format_deltas(deltas, &self.currency_symbol, self.content.as_deref());
        match notifier.notify(&payload).await {
            Ok(result) => {
                tracing::info!(
                    "{} announced {} new products in {} messages",
                    notifier.name(),
                    deltas.len(),
                    result.messages_sent
                );
                DispatchOutcome::Sent {
                    messages: result.messages_sent,
                }
            }
            Err(e) => {
                tracing::error!("{} failed: {}", notifier.name(), e);
                DispatchOutcome::Failed { error: e.to_string() }
            }
        }
    }
}
