//! Outbound message shapes: text, button menus, quick replies, generic cards and receipts.
//!
//! These are plain values; the Messenger wire format lives in `channels::messenger`.
//! The same types double as template data in the config file, so they derive serde.

use serde::{Deserialize, Serialize};

/// One reply to deliver to a user.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Text { body: String },
    ButtonMenu { prompt: String, buttons: Vec<Button> },
    QuickReplyMenu { prompt: String, options: Vec<QuickReply> },
    GenericCards { cards: Vec<Card> },
    Receipt(Receipt),
}

impl OutboundMessage {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Text { .. } => "text",
            OutboundMessage::ButtonMenu { .. } => "button menu",
            OutboundMessage::QuickReplyMenu { .. } => "quick replies",
            OutboundMessage::GenericCards { .. } => "generic template",
            OutboundMessage::Receipt(_) => "receipt template",
        }
    }
}

/// What a button does when tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ButtonAction {
    /// Sends a postback with this payload back to the webhook.
    Postback { payload: String },
    /// Opens a web page.
    WebUrl { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn postback(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Postback {
                payload: payload.into(),
            },
        }
    }

    pub fn web_url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::WebUrl { url: url.into() },
        }
    }
}

/// A quick-reply chip; selecting it returns `payload` to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    pub label: String,
    pub payload: String,
}

impl QuickReply {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// One element of a generic (carousel) template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub title: String,
    pub image_url: String,
    pub subtitle: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub quantity: u32,
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_1: String,
    pub city: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total_tax: f64,
    pub total_cost: f64,
}

/// Discount or surcharge line. Amounts may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub recipient_name: String,
    pub order_id: String,
    pub currency: String,
    pub payment_method: String,
    /// Order time, Unix seconds.
    pub timestamp: Option<i64>,
    pub line_items: Vec<LineItem>,
    pub address: Address,
    pub summary: Summary,
    pub adjustments: Vec<Adjustment>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidMessage {
    #[error("receipt order id is empty")]
    EmptyOrderId,
    #[error("line item '{0}' has a negative or non-finite price")]
    LineItemPrice(String),
    #[error("receipt summary field '{0}' is negative or non-finite")]
    SummaryAmount(&'static str),
    #[error("adjustment '{0}' amount is not finite")]
    AdjustmentAmount(String),
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

impl Summary {
    pub fn validate(&self) -> Result<(), InvalidMessage> {
        for (name, v) in [
            ("subtotal", self.subtotal),
            ("shippingCost", self.shipping_cost),
            ("totalTax", self.total_tax),
            ("totalCost", self.total_cost),
        ] {
            if !non_negative(v) {
                return Err(InvalidMessage::SummaryAmount(name));
            }
        }
        Ok(())
    }
}

impl LineItem {
    pub fn validate(&self) -> Result<(), InvalidMessage> {
        if !non_negative(self.price) {
            return Err(InvalidMessage::LineItemPrice(self.title.clone()));
        }
        Ok(())
    }
}

impl Adjustment {
    pub fn validate(&self) -> Result<(), InvalidMessage> {
        if !self.amount.is_finite() {
            return Err(InvalidMessage::AdjustmentAmount(self.name.clone()));
        }
        Ok(())
    }
}

impl Receipt {
    /// Amounts are non-negative except adjustments (discounts may be negative).
    pub fn validate(&self) -> Result<(), InvalidMessage> {
        if self.order_id.trim().is_empty() {
            return Err(InvalidMessage::EmptyOrderId);
        }
        for item in &self.line_items {
            item.validate()?;
        }
        self.summary.validate()?;
        for adj in &self.adjustments {
            adj.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> Receipt {
        Receipt {
            recipient_name: "Peter Chang".to_string(),
            order_id: "order-1".to_string(),
            currency: "USD".to_string(),
            payment_method: "Visa 1234".to_string(),
            timestamp: None,
            line_items: vec![LineItem {
                title: "Oculus Rift".to_string(),
                subtitle: None,
                quantity: 1,
                price: 599.0,
                currency: None,
                image_url: None,
            }],
            address: Address {
                street_1: "1 Hacker Way".to_string(),
                city: "Menlo Park".to_string(),
                postal_code: "94025".to_string(),
                state: "CA".to_string(),
                country: "US".to_string(),
            },
            summary: Summary {
                subtotal: 599.0,
                shipping_cost: 0.0,
                total_tax: 0.0,
                total_cost: 549.0,
            },
            adjustments: vec![Adjustment {
                name: "Discount".to_string(),
                amount: -50.0,
            }],
        }
    }

    #[test]
    fn negative_adjustment_is_allowed() {
        assert_eq!(receipt().validate(), Ok(()));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut r = receipt();
        r.line_items[0].price = -1.0;
        assert_eq!(
            r.validate(),
            Err(InvalidMessage::LineItemPrice("Oculus Rift".to_string()))
        );
    }

    #[test]
    fn negative_summary_is_rejected() {
        let mut r = receipt();
        r.summary.total_tax = -0.01;
        assert_eq!(r.validate(), Err(InvalidMessage::SummaryAmount("totalTax")));
    }

    #[test]
    fn empty_order_id_is_rejected() {
        let mut r = receipt();
        r.order_id = " ".to_string();
        assert_eq!(r.validate(), Err(InvalidMessage::EmptyOrderId));
    }

    #[test]
    fn button_action_config_shape() {
        let b: Button = serde_json::from_str(
            r#"{"label":"Ver detalhes","action":{"type":"webUrl","url":"https://example.com"}}"#,
        )
        .unwrap();
        assert_eq!(b, Button::web_url("Ver detalhes", "https://example.com"));
    }
}
