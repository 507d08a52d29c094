//! Voyager LLM integration layer.
//!
//! Provides a unified interface over text-generation providers. The
//! pipeline never talks to a provider's wire format directly; it goes
//! through the `LlmClient` trait and explicit request/response types.

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, MockClient};
