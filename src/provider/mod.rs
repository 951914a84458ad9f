//! LLM Provider abstraction module
//!
//! This module provides the provider trait, the OpenAI-compatible HTTP
//! provider, an offline provider for dry runs, and the shared request types.

pub mod factory;
pub mod http;
pub mod offline;
pub mod traits;
pub mod types;

// Re-export main types
pub use factory::ProviderFactory;
pub use http::HttpProvider;
pub use offline::OfflineProvider;
pub use traits::{GenerateResponse, LlmProvider, ToolInvocation};
pub use types::{GenerateConfig, Message, MessageRole};
