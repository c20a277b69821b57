use async_trait::async_trait;

use crate::errors::DeliveryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { recipients: usize },
    Skipped(String),
}

/// Hands a finished digest to whatever carries it to readers.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, subject: &str, body: &str) -> Result<DeliveryOutcome, DeliveryError>;
}
