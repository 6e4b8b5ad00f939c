//! Messenger channel: deliver replies through the Graph Send API (`POST /me/messages`).

use crate::channels::sender::{OutboundSender, SendFailed};
use crate::message::{Button, ButtonAction, Card, QuickReply, Receipt};
use async_trait::async_trait;
use serde_json::{json, Value};

pub const GRAPH_API_BASE: &str = "https://graph.facebook.com/v2.6";

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("page access token not configured")]
    NotConfigured,
    #[error("send api request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("send api error: {0}")]
    Api(String),
}

impl From<MessengerError> for SendFailed {
    fn from(e: MessengerError) -> Self {
        SendFailed(e.to_string())
    }
}

/// Send API client for one page.
#[derive(Clone)]
pub struct MessengerClient {
    api_base: String,
    page_access_token: Option<String>,
    client: reqwest::Client,
}

impl MessengerClient {
    pub fn new(api_base: Option<String>, page_access_token: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| GRAPH_API_BASE.to_string());
        Self {
            api_base,
            page_access_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// POST one Send API request body.
    async fn post_message(&self, body: &Value) -> Result<(), MessengerError> {
        let token = self
            .page_access_token
            .as_deref()
            .ok_or(MessengerError::NotConfigured)?;
        let url = format!("{}/me/messages", self.api_base);
        let res = self
            .client
            .post(&url)
            .query(&[("access_token", token)])
            .json(body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(MessengerError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

fn envelope(recipient_id: &str, message: Value) -> Value {
    json!({
        "recipient": { "id": recipient_id },
        "message": message,
    })
}

fn template(recipient_id: &str, payload: Value) -> Value {
    envelope(
        recipient_id,
        json!({ "attachment": { "type": "template", "payload": payload } }),
    )
}

fn button_json(button: &Button) -> Value {
    match &button.action {
        ButtonAction::Postback { payload } => {
            json!({ "type": "postback", "title": button.label, "payload": payload })
        }
        ButtonAction::WebUrl { url } => {
            json!({ "type": "web_url", "title": button.label, "url": url })
        }
    }
}

pub(crate) fn text_body(recipient_id: &str, text: &str) -> Value {
    envelope(recipient_id, json!({ "text": text }))
}

pub(crate) fn quick_replies_body(recipient_id: &str, prompt: &str, options: &[QuickReply]) -> Value {
    let quick_replies: Vec<Value> = options
        .iter()
        .map(|o| json!({ "content_type": "text", "title": o.label, "payload": o.payload }))
        .collect();
    envelope(
        recipient_id,
        json!({ "text": prompt, "quick_replies": quick_replies }),
    )
}

pub(crate) fn button_template_body(recipient_id: &str, prompt: &str, buttons: &[Button]) -> Value {
    template(
        recipient_id,
        json!({
            "template_type": "button",
            "text": prompt,
            "buttons": buttons.iter().map(button_json).collect::<Vec<_>>(),
        }),
    )
}

pub(crate) fn generic_template_body(recipient_id: &str, cards: &[Card]) -> Value {
    let elements: Vec<Value> = cards
        .iter()
        .map(|c| {
            json!({
                "title": c.title,
                "image_url": c.image_url,
                "subtitle": c.subtitle,
                "buttons": c.buttons.iter().map(button_json).collect::<Vec<_>>(),
            })
        })
        .collect();
    template(
        recipient_id,
        json!({ "template_type": "generic", "elements": elements }),
    )
}

pub(crate) fn receipt_template_body(recipient_id: &str, receipt: &Receipt) -> Value {
    let elements: Vec<Value> = receipt
        .line_items
        .iter()
        .map(|item| {
            let mut e = json!({
                "title": item.title,
                "quantity": item.quantity,
                "price": item.price,
            });
            if let Some(ref s) = item.subtitle {
                e["subtitle"] = Value::String(s.clone());
            }
            if let Some(ref c) = item.currency {
                e["currency"] = Value::String(c.clone());
            }
            if let Some(ref u) = item.image_url {
                e["image_url"] = Value::String(u.clone());
            }
            e
        })
        .collect();
    let mut payload = json!({
        "template_type": "receipt",
        "recipient_name": receipt.recipient_name,
        "order_number": receipt.order_id,
        "currency": receipt.currency,
        "payment_method": receipt.payment_method,
        "elements": elements,
        "address": {
            "street_1": receipt.address.street_1,
            "city": receipt.address.city,
            "postal_code": receipt.address.postal_code,
            "state": receipt.address.state,
            "country": receipt.address.country,
        },
        "summary": {
            "subtotal": receipt.summary.subtotal,
            "shipping_cost": receipt.summary.shipping_cost,
            "total_tax": receipt.summary.total_tax,
            "total_cost": receipt.summary.total_cost,
        },
        "adjustments": receipt
            .adjustments
            .iter()
            .map(|a| json!({ "name": a.name, "amount": a.amount }))
            .collect::<Vec<_>>(),
    });
    if let Some(ts) = receipt.timestamp {
        payload["timestamp"] = Value::String(ts.to_string());
    }
    template(recipient_id, payload)
}

#[async_trait]
impl OutboundSender for MessengerClient {
    async fn send_text(&self, recipient_id: &str, body: &str) -> Result<(), SendFailed> {
        Ok(self.post_message(&text_body(recipient_id, body)).await?)
    }

    async fn send_buttons(
        &self,
        recipient_id: &str,
        prompt: &str,
        buttons: &[Button],
    ) -> Result<(), SendFailed> {
        Ok(self
            .post_message(&button_template_body(recipient_id, prompt, buttons))
            .await?)
    }

    async fn send_quick_replies(
        &self,
        recipient_id: &str,
        prompt: &str,
        options: &[QuickReply],
    ) -> Result<(), SendFailed> {
        Ok(self
            .post_message(&quick_replies_body(recipient_id, prompt, options))
            .await?)
    }

    async fn send_generic_template(
        &self,
        recipient_id: &str,
        cards: &[Card],
    ) -> Result<(), SendFailed> {
        Ok(self
            .post_message(&generic_template_body(recipient_id, cards))
            .await?)
    }

    async fn send_receipt_template(
        &self,
        recipient_id: &str,
        receipt: &Receipt,
    ) -> Result<(), SendFailed> {
        Ok(self
            .post_message(&receipt_template_body(recipient_id, receipt))
            .await?)
    }
}
