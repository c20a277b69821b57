use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Tokyo;
use tracing::{info, instrument, warn};

use shinbun_core::{Delivery, DeliveryOutcome, DigestClient, DigestError, Message, PromptBundle};

use crate::error::EngineError;
use crate::prompt::PromptAssembler;

/// `Shinbun Summary [{focus}] - YYYY-MM-DD`, dated in JST.
pub fn subject_line(focus: &str, now: DateTime<Utc>) -> String {
    format!(
        "Shinbun Summary [{focus}] - {}",
        now.with_timezone(&Tokyo).format("%Y-%m-%d")
    )
}

/// A finished digest. `generated` is false when the body is the
/// placeholder returned without calling the model.
#[derive(Clone, Debug)]
pub struct Digest {
    pub subject: String,
    pub body: String,
    pub prompt: PromptBundle,
    pub generated: bool,
}

pub struct DigestRunner {
    assembler: PromptAssembler,
    client: Arc<dyn DigestClient>,
}

impl DigestRunner {
    pub fn new(assembler: PromptAssembler, client: Arc<dyn DigestClient>) -> Self {
        Self { assembler, client }
    }

    #[instrument(skip(self, messages), fields(messages = messages.len(), model = self.client.model()))]
    pub async fn run(
        &self,
        messages: &[Message],
        focus: &str,
        now: DateTime<Utc>,
    ) -> Result<Digest, EngineError> {
        let prompt = self.assembler.assemble(messages, focus, now);
        let subject = subject_line(prompt.focus.as_str(), now);

        if !prompt.is_renderable() {
            warn!(truncated = prompt.truncated, "nothing renderable, skipping model call");
            return Ok(Digest {
                subject,
                body: prompt.user_prompt.clone(),
                prompt,
                generated: false,
            });
        }

        let body = self.client.complete(&prompt).await?;
        let body = body.trim();
        if body.is_empty() {
            return Err(DigestError::EmptyResponse.into());
        }

        info!(
            client = self.client.name(),
            included = prompt.included_message_count,
            truncated = prompt.truncated,
            chars = body.len(),
            "digest generated"
        );
        Ok(Digest {
            subject,
            body: body.to_string(),
            prompt,
            generated: true,
        })
    }

    pub async fn deliver(
        &self,
        digest: &Digest,
        delivery: &dyn Delivery,
    ) -> Result<DeliveryOutcome, EngineError> {
        let outcome = delivery.deliver(&digest.subject, &digest.body).await?;
        match &outcome {
            DeliveryOutcome::Sent { recipients } => info!(recipients, subject = %digest.subject, "digest delivered"),
            DeliveryOutcome::Skipped(reason) => info!(reason = %reason, "digest delivery skipped"),
        }
        Ok(outcome)
    }
}
