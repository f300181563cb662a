pub mod notifier;

pub use notifier::{Embed, EmbedImage, MessagePayload, NotificationResult, NotifierPlugin};
