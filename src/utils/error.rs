use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error: {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Invalid price: {input:?}")]
    PriceFormat { input: String },

    #[error("Dispatch error: HTTP {status}: {body}")]
    Dispatch { status: u16, body: String },

    #[error("Persistence error: {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source config error: {}: {message}", .path.display())]
    SourceConfig { path: PathBuf, message: String },
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
