//! Request and message types shared by all providers.

pub mod generate;
pub mod message;

pub use generate::GenerateConfig;
pub use message::{Message, MessageRole};
