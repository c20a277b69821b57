//! Settings error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A value the selected run mode needs is absent.
    #[error("missing required setting: {0}")]
    Missing(String),
    /// A numeric setting outside the range the pipeline can represent.
    #[error("setting {key} is {value}, expected at most {max}")]
    OutOfRange { key: String, value: u64, max: u64 },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_display_names_key() {
        let err = SettingsError::Missing("slack.botToken".into());
        assert_eq!(err.to_string(), "missing required setting: slack.botToken");
    }

    #[test]
    fn out_of_range_display() {
        let err = SettingsError::OutOfRange {
            key: "sync.historyWindowDays".into(),
            value: 9000,
            max: 3650,
        };
        assert_eq!(err.to_string(), "setting sync.historyWindowDays is 9000, expected at most 3650");
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err: SettingsError = json_err.into();
        assert!(matches!(err, SettingsError::Json(_)));
    }
}
