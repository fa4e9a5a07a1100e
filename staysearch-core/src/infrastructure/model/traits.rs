//! Model traits

use super::types::{GenerationRequest, ModelError};
use async_trait::async_trait;

/// A service that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier used in log lines and errors.
    fn id(&self) -> &str;

    /// Returns the generated text blocks in order.
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<String>, ModelError>;
}
