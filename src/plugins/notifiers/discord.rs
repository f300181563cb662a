use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::DiscordConfig;
use crate::plugins::traits::{MessagePayload, NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Posts messages to a channel through the Discord bot API.
pub struct DiscordNotifier {
    client: Client,
    endpoint: String,
    bot_token: String,
    max_embeds_per_message: usize,
}

impl DiscordNotifier {
    /// `None` when the channel or token is not configured.
    pub fn from_config(config: &DiscordConfig) -> Result<Option<Self>> {
        let Some((channel_id, bot_token)) = config.credentials() else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Some(Self {
            client,
            endpoint: format!(
                "{}/channels/{}/messages",
                config.api_base.trim_end_matches('/'),
                channel_id
            ),
            bot_token: bot_token.to_string(),
            max_embeds_per_message: config.max_embeds_per_message.max(1),
        }))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Split a payload into messages Discord will accept. The header content rides
    /// on the first message only.
    fn batches(&self, payload: &MessagePayload) -> Vec<MessagePayload> {
        payload
            .embeds
            .chunks(self.max_embeds_per_message)
            .enumerate()
            .map(|(index, embeds)| MessagePayload {
                content: if index == 0 { payload.content.clone() } else { None },
                embeds: embeds.to_vec(),
            })
            .collect()
    }

    async fn post(&self, message: &MessagePayload) -> Result<Option<String>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Dispatch {
                status: status.as_u16(),
                body,
            });
        }

        // A body without an id still counts as delivered
        let created = response.json::<CreatedMessage>().await.ok();
        Ok(created.map(|m| m.id))
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    async fn notify(&self, payload: &MessagePayload) -> Result<NotificationResult> {
        let batches = self.batches(payload);
        let mut message_ids = Vec::new();

        for (index, message) in batches.iter().enumerate() {
            tracing::debug!(
                "Posting message {}/{} with {} embeds",
                index + 1,
                batches.len(),
                message.embeds.len()
            );
            match self.post(message).await {
                Ok(Some(id)) => message_ids.push(id),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        "Discord post {}/{} failed after {} messages were delivered: {}",
                        index + 1,
                        batches.len(),
                        index,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(NotificationResult {
            success: true,
            messages_sent: batches.len(),
            message_ids,
        })
    }
}
