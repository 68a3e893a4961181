use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// A build artifact known to the Commerce Cloud build API.
///
/// Built once from a single API record and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: Option<String>,
    /// Display name of the build (e.g. "20240501.3")
    pub code: Option<String>,
    pub branch: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    /// Status as reported by the API (e.g. "SUCCESS", "FAIL")
    pub status: Option<String>,
    pub deletable: bool,
    /// Explanation supplied by the API when the build cannot be deleted
    pub delete_reason: Option<String>,
    #[serde(rename = "self")]
    pub self_link: Option<Url>,
    /// The record exactly as received
    pub raw: Value,
}

impl Build {
    pub fn display_name(&self) -> &str {
        match (&self.code, &self.id) {
            (Some(code), _) if !code.trim().is_empty() => code,
            (_, Some(id)) => id,
            _ => "<unknown>",
        }
    }

    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.created_at.is_some_and(|created| created < cutoff)
    }

    pub fn effective_delete_reason(&self) -> &str {
        match &self.delete_reason {
            Some(reason) if !reason.trim().is_empty() => reason,
            _ if !self.deletable => "Build is not deletable",
            _ => "",
        }
    }
}

/// Result of a single delete attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneOutcome {
    pub build_id: String,
    pub deleted: bool,
    /// HTTP status, or 0 when the request never reached the server
    pub status_code: u16,
    pub message: String,
}

impl PruneOutcome {
    pub fn deleted(build_id: impl Into<String>, status_code: u16) -> Self {
        Self {
            build_id: build_id.into(),
            deleted: true,
            status_code,
            message: "Deleted".to_string(),
        }
    }

    pub fn failed(build_id: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            deleted: false,
            status_code,
            message: message.into(),
        }
    }

    pub fn interrupted(build_id: impl Into<String>) -> Self {
        Self::failed(build_id, 0, "Interrupted")
    }
}
