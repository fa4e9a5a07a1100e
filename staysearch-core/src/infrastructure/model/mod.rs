//! Text-generation service clients.

pub mod clients;
pub mod traits;
pub mod types;

pub use clients::AnthropicClient;
pub use traits::TextGenerator;
pub use types::{ChatMessage, GenerationRequest, MessageRole, ModelError};
