use std::time::Duration;

/// Failures while talking to the chat service or the local cache during sync.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SyncError {
    #[error("channel not found: {0}")]
    NotFound(String),
    #[error("channel not found or bot lacks access: {0}")]
    PermissionOrMissing(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn suggested_delay(&self) -> Option<Duration> {
        if let Self::RateLimited { retry_after } = self {
            *retry_after
        } else {
            None
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::PermissionOrMissing(_) => "permission_or_missing",
            Self::Transport(_) => "transport",
            Self::RateLimited { .. } => "rate_limited",
            Self::Persistence(_) => "persistence",
        }
    }
}

/// Failures from the completion model.
#[derive(Clone, Debug, thiserror::Error)]
pub enum DigestError {
    // Fatal
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // Retryable
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),

    #[error("model returned no content")]
    EmptyResponse,
}

impl DigestError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::InvalidRequest(_))
    }

    pub fn suggested_delay(&self) -> Option<Duration> {
        if let Self::RateLimited { retry_after } = self {
            *retry_after
        } else {
            None
        }
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::Server { .. } => "server",
            Self::Network(_) => "network",
            Self::EmptyResponse => "empty_response",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Authentication(body),
            400 | 404 | 422 => Self::InvalidRequest(body),
            429 => Self::RateLimited { retry_after: None },
            500..=599 => Self::Server { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery misconfigured: {0}")]
    Config(String),
    #[error("delivery failed: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limit_is_retryable_during_sync() {
        assert!(SyncError::RateLimited { retry_after: None }.is_retryable());
        assert!(!SyncError::Transport("reset".into()).is_retryable());
        assert!(!SyncError::PermissionOrMissing("C1".into()).is_retryable());
        assert!(!SyncError::NotFound("general".into()).is_retryable());
        assert!(!SyncError::Persistence("locked".into()).is_retryable());
    }

    #[test]
    fn sync_suggested_delay_only_for_rate_limit() {
        let rl = SyncError::RateLimited {
            retry_after: Some(Duration::from_secs(12)),
        };
        assert_eq!(rl.suggested_delay(), Some(Duration::from_secs(12)));
        assert_eq!(SyncError::Transport("x".into()).suggested_delay(), None);
    }

    #[test]
    fn sync_error_kind_strings() {
        assert_eq!(SyncError::NotFound("x".into()).error_kind(), "not_found");
        assert_eq!(
            SyncError::PermissionOrMissing("x".into()).error_kind(),
            "permission_or_missing"
        );
    }

    #[test]
    fn digest_from_status_mapping() {
        assert!(DigestError::from_status(401, "unauthorized".into()).is_fatal());
        assert!(DigestError::from_status(400, "bad".into()).is_fatal());
        assert!(DigestError::from_status(429, "slow down".into()).is_retryable());
        assert!(DigestError::from_status(500, "internal".into()).is_retryable());
        assert!(DigestError::from_status(503, "unavailable".into()).is_retryable());
        assert!(DigestError::from_status(418, "teapot".into()).is_fatal());
    }

    #[test]
    fn empty_response_is_neither_fatal_nor_retryable() {
        assert!(!DigestError::EmptyResponse.is_retryable());
        assert!(!DigestError::EmptyResponse.is_fatal());
        assert_eq!(DigestError::EmptyResponse.error_kind(), "empty_response");
    }
}
