//! Conversation routing: inbound event -> step handler.
//!
//! Stateless. The step is inferred from the payload token prefix alone; nothing is
//! remembered between calls, so any free text restarts the flow (except the receipt keyword).

use crate::webhook::InboundEvent;

/// Free-text keyword that triggers the receipt demo. Compared case-insensitively.
pub const RECEIPT_KEYWORD: &str = "recibo";

/// Positions in the trip-planning flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConversationStep {
    Start,
    TripPurpose,
    Budget,
    TouristProfile,
    Season,
    Recommendation,
}

impl ConversationStep {
    /// The step that follows this one; `None` once the recommendation is reached.
    pub fn next(self) -> Option<ConversationStep> {
        match self {
            ConversationStep::Start => Some(ConversationStep::TripPurpose),
            ConversationStep::TripPurpose => Some(ConversationStep::Budget),
            ConversationStep::Budget => Some(ConversationStep::TouristProfile),
            ConversationStep::TouristProfile => Some(ConversationStep::Season),
            ConversationStep::Season => Some(ConversationStep::Recommendation),
            ConversationStep::Recommendation => None,
        }
    }
}

/// Prefix table, evaluated in order; first match wins.
const PREFIXES: [(&str, ConversationStep); 5] = [
    ("SEARCH", ConversationStep::Start),
    ("TRIP_FOR", ConversationStep::TripPurpose),
    ("BUDGET", ConversationStep::Budget),
    ("TOURISM", ConversationStep::TouristProfile),
    ("SEASON", ConversationStep::Season),
];

/// A postback or quick-reply payload string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadToken<'a>(pub &'a str);

impl PayloadToken<'_> {
    /// Step selected by this token, or `None` when no prefix matches.
    pub fn step(&self) -> Option<ConversationStep> {
        PREFIXES
            .iter()
            .find(|(prefix, _)| self.0.starts_with(prefix))
            .map(|(_, step)| *step)
    }
}

/// Which handler to run for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepInvocation {
    Step(ConversationStep),
    Receipt,
}

/// Pick the handler for `event`. `None` means no reply is sent.
pub fn route(event: &InboundEvent) -> Option<StepInvocation> {
    match event {
        InboundEvent::TextMessage { text, .. } => {
            if text.to_lowercase() == RECEIPT_KEYWORD {
                Some(StepInvocation::Receipt)
            } else {
                Some(StepInvocation::Step(ConversationStep::Start))
            }
        }
        InboundEvent::QuickReplySelection { payload, .. } | InboundEvent::Postback { payload, .. } => {
            let step = PayloadToken(payload).step();
            if step.is_none() {
                log::debug!("no step matches payload '{}', ignoring", payload);
            }
            step.map(StepInvocation::Step)
        }
        InboundEvent::Unsupported { sender_id, .. } => {
            log::info!("received unsupported message from user '{}'", sender_id);
            None
        }
    }
}
