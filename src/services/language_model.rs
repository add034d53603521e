use async_trait::async_trait;

use crate::error::AppResult;

/// Opaque text generation capability: fixed instructions plus a per-turn
/// prompt in, raw text out.
#[async_trait]
pub trait LanguageModelService: Send + Sync {
    async fn generate(&self, instructions: &str, prompt: &str) -> AppResult<String>;
}
