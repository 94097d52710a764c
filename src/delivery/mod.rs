//! Delivery channels the pipeline reports through
//!
//! A channel posts a placeholder for each batch and later replaces it with
//! the rendered report.

pub mod console;
pub mod telegram;

use crate::error::DeliveryError;
use crate::lookup::ReportStyle;
use async_trait::async_trait;

pub use console::ConsoleChannel;
pub use telegram::{TelegramApi, TelegramChannel};

/// Identifier of a message posted through a channel
pub type MessageId = i64;

/// Transient text shown while a batch is being looked up
pub const PLACEHOLDER: &str = "⏳";

/// Chat transport used by the pipeline
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Post a new message rendered with the channel's report markup
    async fn send(&self, text: &str) -> Result<MessageId, DeliveryError>;

    /// Post a new message as plain text, without markup
    async fn send_text(&self, text: &str) -> Result<MessageId, DeliveryError> {
        self.send(text).await
    }

    /// Replace the content of a previously posted message
    async fn replace(&self, message: MessageId, text: &str) -> Result<(), DeliveryError>;

    /// Post the progress placeholder for a batch
    async fn post_placeholder(&self) -> Result<MessageId, DeliveryError> {
        self.send(PLACEHOLDER).await
    }

    /// Markup this channel renders
    fn report_style(&self) -> ReportStyle {
        ReportStyle::Html
    }
}
