pub mod config;
pub mod diff;
pub mod extractor;
pub mod models;
pub mod plugins;
pub mod price;
pub mod scraper;
pub mod snapshot_store;
pub mod utils;
pub mod watcher;

// Re-export commonly used types
pub use config::AppConfig;
pub use snapshot_store::SnapshotStore;
pub use utils::error::{AppError, Result};
pub use watcher::{DispatchOutcome, RunSummary, Watcher};
