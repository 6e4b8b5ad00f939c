//! Triptt core library — Messenger webhook verification, event routing, conversation
//! steps and the gateway used by the CLI.

pub mod channels;
pub mod config;
pub mod conversation;
pub mod gateway;
pub mod init;
pub mod message;
pub mod routing;
pub mod webhook;
