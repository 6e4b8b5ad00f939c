//! Gateway: the HTTP front door for Messenger callbacks.
//!
//! `GET /callback` answers the subscription handshake; `POST /callback` carries signed
//! event batches. Each request is handled independently; no state is shared between them.

mod server;

pub use server::{router, run_gateway, GatewayState};
