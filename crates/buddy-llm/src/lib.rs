//! Completion client for Travel Buddy.
//!
//! Defines the [`CompletionClient`] boundary the router talks to and an
//! Azure OpenAI chat-completions implementation of it.

pub mod azure;
pub mod client;
pub mod error;

pub use azure::AzureOpenAiClient;
pub use client::{ChatMessage, Completion, CompletionClient, CompletionRequest, MessageRole};
pub use error::LlmError;
