use std::error::Error as _;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildToolError {
    #[error("{0}")]
    Config(String),

    #[error("Failed to fetch builds (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response JSON does not contain a builds array")]
    NoBuildsArray,

    #[error("Network error")]
    Network(#[from] reqwest::Error),

    #[error("Invalid JSON response")]
    Json(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl BuildToolError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The message followed by every underlying cause, joined with `: `.
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

pub type Result<T> = std::result::Result<T, BuildToolError>;

/// Returns the trimmed value, or a configuration error carrying `message` when
/// the value is missing or blank.
pub fn require_non_blank<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BuildToolError::config(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_blank_accepts_value() {
        assert_eq!(require_non_blank(Some(" abc "), "missing").unwrap(), "abc");
    }

    #[test]
    fn require_non_blank_rejects_blank_and_missing() {
        for value in [None, Some(""), Some("   ")] {
            let err = require_non_blank(value, "Project ID is required").unwrap_err();
            assert!(err.is_config());
            assert_eq!(err.to_string(), "Project ID is required");
        }
    }

    #[test]
    fn api_error_mentions_status_and_body() {
        let err = BuildToolError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch builds (status 503): unavailable"
        );
        assert!(!err.is_config());
    }

    #[test]
    fn detailed_includes_causes() {
        let err = BuildToolError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ));
        assert_eq!(err.to_string(), "IO error");
        assert_eq!(err.detailed(), "IO error: connection reset");

        let err = BuildToolError::config("Build ID is required");
        assert_eq!(err.detailed(), "Build ID is required");
    }
}
