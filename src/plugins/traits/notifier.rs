use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// One chat message: an optional header line and one embed per new product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: EmbedImage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub messages_sent: usize,
    pub message_ids: Vec<String>,
}

/// Trait for implementing notification sinks (Discord, etc.)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;

    /// Deliver the payload. Non-2xx answers are `AppError::Dispatch`.
    async fn notify(&self, payload: &MessagePayload) -> Result<NotificationResult>;
}
