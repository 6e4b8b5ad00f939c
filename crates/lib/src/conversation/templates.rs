//! Reply copy for each step. Built-in defaults; any section can be replaced from the config file.

use crate::message::{Address, Adjustment, Button, Card, InvalidMessage, LineItem, QuickReply, Summary};
use serde::{Deserialize, Serialize};

const PRODUCT_IMAGE_URL: &str = "http://img.olx.com.br/images/79/798701037760443.jpg";
const DESTINATION_IMAGE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/b/b9/Buzios_11_2006_03.JPG";
const DESTINATION_DETAILS_URL: &str = "https://www.tripadvisor.com.br/Vacation_Packages-g303492-Armacao_dos_Buzios_State_of_Rio_de_Janeiro-Vacations.html";

/// Prompt plus a list of (label, payload) choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuTemplate {
    pub prompt: String,
    pub options: Vec<QuickReply>,
}

/// Final step: acknowledgement text followed by destination cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationTemplate {
    pub acknowledgement: String,
    pub cards: Vec<Card>,
}

/// Everything in a receipt except the order id, which is generated per send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTemplate {
    pub recipient_name: String,
    pub currency: String,
    pub payment_method: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub line_items: Vec<LineItem>,
    pub address: Address,
    pub summary: Summary,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

/// All reply templates. Missing sections in config fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Templates {
    /// Greeting; options are rendered as postback buttons.
    pub start: MenuTemplate,
    pub trip_purpose: MenuTemplate,
    pub budget: MenuTemplate,
    pub tourist_profile: MenuTemplate,
    pub recommendation: RecommendationTemplate,
    pub receipt: ReceiptTemplate,
}

impl Templates {
    /// Check amounts in the receipt template; called when config is loaded.
    pub fn validate(&self) -> Result<(), InvalidMessage> {
        for item in &self.receipt.line_items {
            item.validate()?;
        }
        self.receipt.summary.validate()?;
        for adj in &self.receipt.adjustments {
            adj.validate()?;
        }
        Ok(())
    }
}

fn menu(prompt: &str, options: &[(&str, &str)]) -> MenuTemplate {
    MenuTemplate {
        prompt: prompt.to_string(),
        options: options
            .iter()
            .map(|(label, payload)| QuickReply::new(*label, *payload))
            .collect(),
    }
}

fn default_destination_card() -> Card {
    Card {
        title: "Armação de búzios".to_string(),
        image_url: DESTINATION_IMAGE_URL.to_string(),
        subtitle: "7 dias\nR$1.200".to_string(),
        buttons: vec![Button::web_url("Ver detalhes", DESTINATION_DETAILS_URL)],
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            start: menu(
                "Olá! Sou o Triptt Beta, vou te ajudar a viajar! Por enquanto, só posso te ajudar a viajar pelo Brasil! Para poder sugerir uma viagem, você precisa responder algumas coisas! Que tipo de viagem você quer fazer?",
                &[("Lazer", "TRIP_FOR_FUN"), ("Trabalho", "TRIP_FOR_WORK")],
            ),
            trip_purpose: menu(
                "Primeiro, quanto você tem disponível para viajar?",
                &[
                    ("R$1.000 a R$5.000", "BUDGET_1K"),
                    ("R$5.000 a R$10.000", "BUDGET_5K"),
                    ("R$10.000 a R$15.000", "BUDGET_10K"),
                ],
            ),
            budget: menu(
                "Em uma viagem, qual tipo de perfil mais se encaixa com você?",
                &[
                    ("Turista clássico", "TOURISM_CLASSIC"),
                    ("Turista aventureiro", "TOURISM_ADVENTURE"),
                    ("Turista ecológico", "TOURISM_ECO"),
                    ("Turista cult", "TOURISM_CULT"),
                    ("Turista nutella", "TOURISM_NUTELLA"),
                ],
            ),
            tourist_profile: menu(
                "Qual estação do ano você mais gosta?",
                &[
                    ("Verão", "SEASON_SUMMER"),
                    ("Inverno", "SEASON_WINTER"),
                    ("Primavera", "SEASON_SPRING"),
                    ("Outono", "SEASON_AUTUMN"),
                ],
            ),
            recommendation: RecommendationTemplate {
                acknowledgement: "Perai! Estamos montando alguns pacotes para você".to_string(),
                cards: vec![default_destination_card(); 3],
            },
            receipt: ReceiptTemplate {
                recipient_name: "Peter Chang".to_string(),
                currency: "USD".to_string(),
                payment_method: "Visa 1234".to_string(),
                timestamp: Some(1428444852),
                line_items: vec![
                    LineItem {
                        title: "Oculus Rift".to_string(),
                        subtitle: Some("Includes: headset, sensor, remote".to_string()),
                        quantity: 1,
                        price: 599.00,
                        currency: Some("USD".to_string()),
                        image_url: Some(PRODUCT_IMAGE_URL.to_string()),
                    },
                    LineItem {
                        title: "Samsung Gear VR".to_string(),
                        subtitle: Some("Frost White".to_string()),
                        quantity: 1,
                        price: 99.99,
                        currency: Some("USD".to_string()),
                        image_url: Some(PRODUCT_IMAGE_URL.to_string()),
                    },
                ],
                address: Address {
                    street_1: "1 Hacker Way".to_string(),
                    city: "Menlo Park".to_string(),
                    postal_code: "94025".to_string(),
                    state: "CA".to_string(),
                    country: "US".to_string(),
                },
                summary: Summary {
                    subtotal: 698.99,
                    shipping_cost: 20.00,
                    total_tax: 57.67,
                    total_cost: 626.66,
                },
                adjustments: vec![
                    Adjustment {
                        name: "New Customer Discount".to_string(),
                        amount: -50.0,
                    },
                    Adjustment {
                        name: "$100 Off Coupon".to_string(),
                        amount: -100.0,
                    },
                ],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Templates::default().validate(), Ok(()));
    }

    #[test]
    fn partial_override_keeps_other_sections() {
        let t: Templates = serde_json::from_str(
            r#"{ "tripPurpose": { "prompt": "Budget?", "options": [ { "label": "Low", "payload": "BUDGET_LOW" } ] } }"#,
        )
        .unwrap();
        assert_eq!(t.trip_purpose.prompt, "Budget?");
        assert_eq!(t.trip_purpose.options.len(), 1);
        assert_eq!(t.budget, Templates::default().budget);
        assert_eq!(t.receipt, Templates::default().receipt);
    }

    #[test]
    fn invalid_receipt_override_fails_validation() {
        let mut t = Templates::default();
        t.receipt.summary.total_cost = -1.0;
        assert!(t.validate().is_err());
    }
}
