//! Step handlers: build the replies for a routed event. Pure; sending happens in the caller.

use crate::conversation::templates::{MenuTemplate, ReceiptTemplate, Templates};
use crate::message::{Button, OutboundMessage, Receipt};
use crate::routing::{ConversationStep, StepInvocation};

/// Fresh receipt order id, `order-<uuid>`.
pub fn new_order_id() -> String {
    format!("order-{}", uuid::Uuid::new_v4().simple())
}

fn quick_reply_menu(menu: &MenuTemplate) -> OutboundMessage {
    OutboundMessage::QuickReplyMenu {
        prompt: menu.prompt.clone(),
        options: menu.options.clone(),
    }
}

fn button_menu(menu: &MenuTemplate) -> OutboundMessage {
    OutboundMessage::ButtonMenu {
        prompt: menu.prompt.clone(),
        buttons: menu
            .options
            .iter()
            .map(|o| Button::postback(o.label.clone(), o.payload.clone()))
            .collect(),
    }
}

fn receipt(template: &ReceiptTemplate, order_id: String) -> OutboundMessage {
    OutboundMessage::Receipt(Receipt {
        recipient_name: template.recipient_name.clone(),
        order_id,
        currency: template.currency.clone(),
        payment_method: template.payment_method.clone(),
        timestamp: template.timestamp,
        line_items: template.line_items.clone(),
        address: template.address.clone(),
        summary: template.summary.clone(),
        adjustments: template.adjustments.clone(),
    })
}

/// Messages for `invocation`, in delivery order.
///
/// The Season handler answers the last question and presents the recommendation, so
/// `Season` and `Recommendation` produce the same replies.
pub fn build_replies(invocation: StepInvocation, templates: &Templates) -> Vec<OutboundMessage> {
    match invocation {
        StepInvocation::Step(ConversationStep::Start) => vec![button_menu(&templates.start)],
        StepInvocation::Step(ConversationStep::TripPurpose) => {
            vec![quick_reply_menu(&templates.trip_purpose)]
        }
        StepInvocation::Step(ConversationStep::Budget) => vec![quick_reply_menu(&templates.budget)],
        StepInvocation::Step(ConversationStep::TouristProfile) => {
            vec![quick_reply_menu(&templates.tourist_profile)]
        }
        StepInvocation::Step(ConversationStep::Season)
        | StepInvocation::Step(ConversationStep::Recommendation) => vec![
            OutboundMessage::Text {
                body: templates.recommendation.acknowledgement.clone(),
            },
            OutboundMessage::GenericCards {
                cards: templates.recommendation.cards.clone(),
            },
        ],
        StepInvocation::Receipt => vec![receipt(&templates.receipt, new_order_id())],
    }
}
