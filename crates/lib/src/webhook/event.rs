//! Inbound callback events and their classification.
//!
//! A callback body looks like `{ "object": "page", "entry": [ { "messaging": [ ... ] } ] }`.
//! Every element of every `messaging` array becomes one [`InboundEvent`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One classified callback entry.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    TextMessage {
        sender_id: String,
        message_id: Option<String>,
        text: String,
        timestamp: Option<DateTime<Utc>>,
    },
    QuickReplySelection {
        sender_id: String,
        recipient_id: Option<String>,
        payload: String,
        timestamp: Option<DateTime<Utc>>,
    },
    Postback {
        sender_id: String,
        recipient_id: Option<String>,
        payload: String,
        timestamp: Option<DateTime<Utc>>,
    },
    /// Anything else with a sender (attachments, delivery and read receipts, ...).
    Unsupported {
        sender_id: String,
        raw_payload: String,
    },
}

impl InboundEvent {
    pub fn sender_id(&self) -> &str {
        match self {
            InboundEvent::TextMessage { sender_id, .. }
            | InboundEvent::QuickReplySelection { sender_id, .. }
            | InboundEvent::Postback { sender_id, .. }
            | InboundEvent::Unsupported { sender_id, .. } => sender_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::TextMessage { .. } => "text",
            InboundEvent::QuickReplySelection { .. } => "quick reply",
            InboundEvent::Postback { .. } => "postback",
            InboundEvent::Unsupported { .. } => "unsupported",
        }
    }
}

/// Why a callback entry was dropped instead of classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationSkip {
    #[error("malformed messaging entry: {0}")]
    Malformed(String),
    #[error("messaging entry has no sender id")]
    MissingSender,
}

#[derive(Debug, Deserialize)]
struct Party {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct QuickReplyBody {
    #[serde(default)]
    payload: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    /// Set on copies of messages the page itself sent.
    #[serde(default)]
    is_echo: bool,
    #[serde(default)]
    mid: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    quick_reply: Option<QuickReplyBody>,
}

#[derive(Debug, Deserialize)]
struct PostbackBody {
    #[serde(default)]
    payload: Option<String>,
}

/// One `messaging` element as delivered by the platform.
#[derive(Debug, Deserialize)]
struct MessagingEntry {
    #[serde(default)]
    sender: Option<Party>,
    #[serde(default)]
    recipient: Option<Party>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    message: Option<MessageBody>,
    #[serde(default)]
    postback: Option<PostbackBody>,
}

/// Classify a single `messaging` element.
///
/// Priority: quick-reply payload, then text, then postback payload, else unsupported.
pub fn classify_entry(raw: &Value) -> Result<InboundEvent, ClassificationSkip> {
    let entry: MessagingEntry = serde_json::from_value(raw.clone())
        .map_err(|e| ClassificationSkip::Malformed(e.to_string()))?;
    let sender_id = entry
        .sender
        .map(|p| p.id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(ClassificationSkip::MissingSender)?;
    let recipient_id = entry.recipient.map(|p| p.id).filter(|id| !id.is_empty());
    let timestamp = entry.timestamp.and_then(DateTime::<Utc>::from_timestamp_millis);

    if let Some(message) = entry.message {
        if message.is_echo {
            return Ok(InboundEvent::Unsupported {
                sender_id,
                raw_payload: raw.to_string(),
            });
        }
        if let Some(payload) = message.quick_reply.and_then(|q| q.payload) {
            return Ok(InboundEvent::QuickReplySelection {
                sender_id,
                recipient_id,
                payload,
                timestamp,
            });
        }
        if let Some(text) = message.text {
            return Ok(InboundEvent::TextMessage {
                sender_id,
                message_id: message.mid,
                text,
                timestamp,
            });
        }
    }
    if let Some(payload) = entry.postback.and_then(|p| p.payload) {
        return Ok(InboundEvent::Postback {
            sender_id,
            recipient_id,
            payload,
            timestamp,
        });
    }
    Ok(InboundEvent::Unsupported {
        sender_id,
        raw_payload: raw.to_string(),
    })
}

/// Classify a verified callback body into events, one per `messaging` element.
/// Bad elements are logged and dropped; the rest of the batch is still returned.
pub fn classify(payload: &Value) -> Vec<InboundEvent> {
    let Some(entries) = payload.get("entry").and_then(Value::as_array) else {
        log::warn!("callback payload has no entry array, nothing to process");
        return Vec::new();
    };
    let mut events = Vec::new();
    for entry in entries {
        let Some(messaging) = entry.get("messaging").and_then(Value::as_array) else {
            log::debug!("callback entry without messaging array skipped");
            continue;
        };
        for raw in messaging {
            match classify_entry(raw) {
                Ok(event) => events.push(event),
                Err(e) => log::warn!("dropping callback entry: {}", e),
            }
        }
    }
    events
}
