//! Messenger webhook protocol: subscription handshake, signature check, event classification.
//!
//! POST bodies must pass [`verify`] before they are parsed; [`classify`] then turns the
//! verified JSON into one [`InboundEvent`] per messaging entry.

mod event;
mod handshake;
mod signature;

pub use event::{classify, classify_entry, ClassificationSkip, InboundEvent};
pub use handshake::{handshake, Rejected, CHALLENGE_PARAM, MODE_PARAM, VERIFY_TOKEN_PARAM};
pub use signature::{sign, verify, VerificationFailed, SIGNATURE_HEADER};
