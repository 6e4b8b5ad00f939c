//! Outbound capability: one method per message shape.

use crate::message::{Button, Card, OutboundMessage, QuickReply, Receipt};
use async_trait::async_trait;

/// Delivery of one message failed. Terminal for the handler that was sending it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("send failed: {0}")]
pub struct SendFailed(pub String);

/// Something that can deliver replies to a user (e.g. the Messenger Send API).
#[async_trait]
pub trait OutboundSender: Send + Sync {
    async fn send_text(&self, recipient_id: &str, body: &str) -> Result<(), SendFailed>;

    async fn send_buttons(
        &self,
        recipient_id: &str,
        prompt: &str,
        buttons: &[Button],
    ) -> Result<(), SendFailed>;

    async fn send_quick_replies(
        &self,
        recipient_id: &str,
        prompt: &str,
        options: &[QuickReply],
    ) -> Result<(), SendFailed>;

    async fn send_generic_template(
        &self,
        recipient_id: &str,
        cards: &[Card],
    ) -> Result<(), SendFailed>;

    async fn send_receipt_template(
        &self,
        recipient_id: &str,
        receipt: &Receipt,
    ) -> Result<(), SendFailed>;
}

/// Send `message` through the matching method of `sender`.
pub async fn deliver(
    sender: &dyn OutboundSender,
    recipient_id: &str,
    message: &OutboundMessage,
) -> Result<(), SendFailed> {
    match message {
        OutboundMessage::Text { body } => sender.send_text(recipient_id, body).await,
        OutboundMessage::ButtonMenu { prompt, buttons } => {
            sender.send_buttons(recipient_id, prompt, buttons).await
        }
        OutboundMessage::QuickReplyMenu { prompt, options } => {
            sender.send_quick_replies(recipient_id, prompt, options).await
        }
        OutboundMessage::GenericCards { cards } => {
            sender.send_generic_template(recipient_id, cards).await
        }
        OutboundMessage::Receipt(receipt) => {
            sender.send_receipt_template(recipient_id, receipt).await
        }
    }
}
