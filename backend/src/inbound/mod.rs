//! Driving adapters: the REST surface and the streaming relay.

pub mod http;
pub mod ws;
