use shinbun_core::{DeliveryError, DigestError, SyncError};

/// Run-level failure. Per-channel sync errors normally end up in a
/// `SyncReport`; this carries the ones that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("digest generation failed: {0}")]
    Digest(#[from] DigestError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl EngineError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Sync(e) => e.error_kind(),
            Self::Digest(e) => e.error_kind(),
            Self::Delivery(_) => "delivery",
        }
    }
}
