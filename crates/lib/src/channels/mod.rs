//! Outbound channels.
//!
//! [`OutboundSender`] is the capability the conversation handlers send through;
//! [`MessengerClient`] implements it against the Messenger Send API.

mod messenger;
mod sender;

pub use messenger::{MessengerClient, MessengerError, GRAPH_API_BASE};
pub use sender::{deliver, OutboundSender, SendFailed};
