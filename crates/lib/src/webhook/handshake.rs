//! Subscription handshake: the platform GETs the callback URL and expects the challenge echoed back.

use subtle::ConstantTimeEq;

pub const MODE_PARAM: &str = "hub.mode";
pub const VERIFY_TOKEN_PARAM: &str = "hub.verify_token";
pub const CHALLENGE_PARAM: &str = "hub.challenge";

const SUBSCRIBE_MODE: &str = "subscribe";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("unexpected hub.mode: {0}")]
    Mode(String),
    #[error("wrong verification token")]
    Token,
}

/// Returns `challenge` unchanged when `mode` is "subscribe" and `token` matches `expected_token`.
pub fn handshake(
    mode: &str,
    token: &str,
    challenge: &str,
    expected_token: &str,
) -> Result<String, Rejected> {
    if mode != SUBSCRIBE_MODE {
        return Err(Rejected::Mode(mode.to_string()));
    }
    let matches = token.len() == expected_token.len()
        && bool::from(token.as_bytes().ct_eq(expected_token.as_bytes()));
    if !matches {
        return Err(Rejected::Token);
    }
    Ok(challenge.to_string())
}
