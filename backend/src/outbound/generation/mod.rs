//! Adapter over the external text-generation API.

mod dto;
mod http_gateway;
mod prompts;

pub use http_gateway::{GenerationConfig, GenerationHttpGateway};
