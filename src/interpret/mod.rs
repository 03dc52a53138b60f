pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

/// Rewrites free text into the structured task template.
#[async_trait]
pub trait Interpreter: Send + Sync {
    fn name(&self) -> &str;
    async fn interpret(&self, text: &str) -> Result<String>;
}
