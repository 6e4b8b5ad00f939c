//! Conversation dispatch: classified event -> route -> replies -> outbound sender.
//!
//! Replies for one event are sent in order; the first failure stops the rest of that
//! event's replies. Failures are logged and never retried.

mod steps;
mod templates;

pub use steps::{build_replies, new_order_id};
pub use templates::{MenuTemplate, ReceiptTemplate, RecommendationTemplate, Templates};

use crate::channels::{deliver, OutboundSender, SendFailed};
use crate::routing;
use crate::webhook::{self, InboundEvent};

/// Counts for one processed callback batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Events classified from the payload.
    pub events: usize,
    /// Messages delivered successfully.
    pub sent: usize,
    /// Events whose replies stopped on a send failure.
    pub failed: usize,
}

fn log_event(event: &InboundEvent) {
    match event {
        InboundEvent::TextMessage {
            sender_id,
            message_id,
            text,
            timestamp,
        } => log::info!(
            "received message '{}' with text '{}' from user '{}' at '{}'",
            message_id.as_deref().unwrap_or("-"),
            text,
            sender_id,
            timestamp.map(|t| t.to_rfc3339()).unwrap_or_default()
        ),
        InboundEvent::QuickReplySelection {
            sender_id,
            recipient_id,
            payload,
            timestamp,
        }
        | InboundEvent::Postback {
            sender_id,
            recipient_id,
            payload,
            timestamp,
        } => log::info!(
            "received {} for user '{}' and page '{}' with payload '{}' at '{}'",
            event.kind(),
            sender_id,
            recipient_id.as_deref().unwrap_or("-"),
            payload,
            timestamp.map(|t| t.to_rfc3339()).unwrap_or_default()
        ),
        InboundEvent::Unsupported { raw_payload, .. } => {
            log::debug!("received unsupported event: {}", raw_payload)
        }
    }
}

async fn run_handler(
    event: &InboundEvent,
    templates: &Templates,
    sender: &dyn OutboundSender,
    sent: &mut usize,
) -> Result<(), SendFailed> {
    log_event(event);
    let Some(invocation) = routing::route(event) else {
        return Ok(());
    };
    let recipient = event.sender_id();
    for message in &build_replies(invocation, templates) {
        deliver(sender, recipient, message).await?;
        log::debug!("sent {} to user '{}'", message.kind(), recipient);
        *sent += 1;
    }
    Ok(())
}

/// Route one event and send its replies. Returns the number of messages sent.
pub async fn handle_event(
    event: &InboundEvent,
    templates: &Templates,
    sender: &dyn OutboundSender,
) -> Result<usize, SendFailed> {
    let mut sent = 0;
    run_handler(event, templates, sender, &mut sent).await?;
    Ok(sent)
}

/// Classify a verified callback payload and handle every event in it.
/// Failures are logged; one failing event does not stop its siblings.
pub async fn process_callback(
    payload: &serde_json::Value,
    templates: &Templates,
    sender: &dyn OutboundSender,
) -> BatchOutcome {
    let events = webhook::classify(payload);
    let mut outcome = BatchOutcome {
        events: events.len(),
        ..BatchOutcome::default()
    };
    for event in &events {
        if let Err(e) = run_handler(event, templates, sender, &mut outcome.sent).await {
            log::error!(
                "message could not be sent to user '{}': {}",
                event.sender_id(),
                e
            );
            outcome.failed += 1;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Button, Card, OutboundMessage, QuickReply, Receipt};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every send; fails the Nth call (0-based) when `fail_at` is set.
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, OutboundMessage)>>,
        calls: Mutex<usize>,
        fail_at: Option<usize>,
    }

    impl RecordingSender {
        fn failing_at(n: usize) -> Self {
            Self {
                fail_at: Some(n),
                ..Self::default()
            }
        }

        fn record(&self, to: &str, m: OutboundMessage) -> Result<(), SendFailed> {
            let mut calls = self.calls.lock().unwrap();
            let n = *calls;
            *calls += 1;
            if self.fail_at == Some(n) {
                return Err(SendFailed("boom".to_string()));
            }
            self.sent.lock().unwrap().push((to.to_string(), m));
            Ok(())
        }

        fn messages(&self) -> Vec<(String, OutboundMessage)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutboundSender for RecordingSender {
        async fn send_text(&self, to: &str, body: &str) -> Result<(), SendFailed> {
            self.record(to, OutboundMessage::Text { body: body.to_string() })
        }

        async fn send_buttons(&self, to: &str, prompt: &str, buttons: &[Button]) -> Result<(), SendFailed> {
            self.record(
                to,
                OutboundMessage::ButtonMenu {
                    prompt: prompt.to_string(),
                    buttons: buttons.to_vec(),
                },
            )
        }

        async fn send_quick_replies(
            &self,
            to: &str,
            prompt: &str,
            options: &[QuickReply],
        ) -> Result<(), SendFailed> {
            self.record(
                to,
                OutboundMessage::QuickReplyMenu {
                    prompt: prompt.to_string(),
                    options: options.to_vec(),
                },
            )
        }

        async fn send_generic_template(&self, to: &str, cards: &[Card]) -> Result<(), SendFailed> {
            self.record(to, OutboundMessage::GenericCards { cards: cards.to_vec() })
        }

        async fn send_receipt_template(&self, to: &str, receipt: &Receipt) -> Result<(), SendFailed> {
            self.record(to, OutboundMessage::Receipt(receipt.clone()))
        }
    }

    fn callback(messaging: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "object": "page", "entry": [ { "id": "PAGE", "time": 1, "messaging": messaging } ] })
    }

    #[tokio::test]
    async fn recibo_text_sends_one_receipt() {
        let sender = RecordingSender::default();
        let outcome = process_callback(
            &callback(vec![json!({ "sender": { "id": "USER" }, "message": { "mid": "m", "text": "Recibo" } })]),
            &Templates::default(),
            &sender,
        )
        .await;
        assert_eq!(outcome, BatchOutcome { events: 1, sent: 1, failed: 0 });
        let sent = sender.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "USER");
        let OutboundMessage::Receipt(r) = &sent[0].1 else {
            panic!("expected receipt, got {:?}", sent[0].1);
        };
        assert_eq!(r.line_items.len(), 2);
        assert_eq!(r.adjustments.len(), 2);
        assert_eq!(r.summary.subtotal, 698.99);
        assert_eq!(r.summary.total_cost, 626.66);
    }

    #[tokio::test]
    async fn budget_postback_sends_profile_menu() {
        let sender = RecordingSender::default();
        process_callback(
            &callback(vec![json!({ "sender": { "id": "USER" }, "postback": { "payload": "BUDGET_5K" } })]),
            &Templates::default(),
            &sender,
        )
        .await;
        let sent = sender.messages();
        assert_eq!(sent.len(), 1);
        let OutboundMessage::QuickReplyMenu { options, .. } = &sent[0].1 else {
            panic!("expected quick replies, got {:?}", sent[0].1);
        };
        assert_eq!(options.len(), 5);
    }

    #[tokio::test]
    async fn unsupported_and_malformed_entries_send_nothing() {
        let sender = RecordingSender::default();
        let outcome = process_callback(
            &callback(vec![
                json!({ "sender": { "id": "A" }, "read": { "watermark": 1 } }),
                json!({ "message": { "text": "no sender" } }),
                json!({ "sender": { "id": "B" }, "postback": { "payload": "UNKNOWN" } }),
                json!({ "sender": { "id": "C" }, "message": { "text": "oi" } }),
            ]),
            &Templates::default(),
            &sender,
        )
        .await;
        assert_eq!(outcome, BatchOutcome { events: 3, sent: 1, failed: 0 });
        let sent = sender.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "C");
        assert_eq!(sent[0].1.kind(), "button menu");
    }

    #[tokio::test]
    async fn send_failure_stops_remaining_replies_for_that_event() {
        let sender = RecordingSender::failing_at(0);
        let event = InboundEvent::QuickReplySelection {
            sender_id: "USER".to_string(),
            recipient_id: None,
            payload: "SEASON_SUMMER".to_string(),
            timestamp: None,
        };
        let err = handle_event(&event, &Templates::default(), &sender)
            .await
            .unwrap_err();
        assert_eq!(err, SendFailed("boom".to_string()));
        assert!(sender.messages().is_empty());
    }

    #[tokio::test]
    async fn send_failure_does_not_stop_siblings() {
        let sender = RecordingSender::failing_at(1);
        let outcome = process_callback(
            &callback(vec![
                json!({ "sender": { "id": "A" }, "postback": { "payload": "SEASON_SPRING" } }),
                json!({ "sender": { "id": "B" }, "postback": { "payload": "SEARCH" } }),
            ]),
            &Templates::default(),
            &sender,
        )
        .await;
        // A: text sent, cards failed (not retracted). B: start menu sent.
        assert_eq!(outcome, BatchOutcome { events: 2, sent: 2, failed: 1 });
        let sent = sender.messages();
        assert_eq!(sent[0].1.kind(), "text");
        assert_eq!(sent[1].0, "B");
    }
}
