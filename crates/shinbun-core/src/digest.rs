use async_trait::async_trait;

use crate::errors::DigestError;
use crate::prompt::PromptBundle;

/// Completion model that turns an assembled prompt into digest text.
#[async_trait]
pub trait DigestClient: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &PromptBundle) -> Result<String, DigestError>;
}
