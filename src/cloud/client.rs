use log::{debug, info};
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use super::records::{extract_build_array, parse_build};
use super::types::{Build, PruneOutcome};
use super::BuildApi;
use crate::auth::Token;
use crate::error::{require_non_blank, BuildToolError, Result};

pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Keys probed, in order, for an error message in a failed delete response.
const ERROR_MESSAGE_KEYS: [&str; 3] = ["message", "error", "detail"];

/// HTTP client for the Commerce Cloud build API.
pub struct CloudClient {
    client: Client,
    base_url: Url,
    token: Token,
}

impl CloudClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// The base URL is normalized to end with exactly one `/` so endpoint
    /// paths can be joined onto it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL or token is blank, or if
    /// the base URL cannot be parsed.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let base_url = normalize_base_url(require_non_blank(Some(base_url), "Base URL is required")?)?;
        let token = Token::from(require_non_blank(Some(token), "API token is required")?);

        let client = Client::builder()
            .user_agent(concat!("ccbuild/", env!("CARGO_PKG_VERSION")))
            // A 3xx is the API's answer, not a hop to follow.
            .redirect(Policy::none())
            .build()
            .map_err(|e| BuildToolError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.as_str())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BuildToolError::config(format!("Invalid endpoint URL '{path}': {e}")))
    }

    pub(crate) fn list_url(&self, project_id: &str, environment_id: &str, limit: i64) -> Result<Url> {
        let mut url = self.endpoint(&format!(
            "subscriptions/{}/builds",
            urlencoding::encode(project_id)
        ))?;
        url.query_pairs_mut()
            .append_pair("environmentCode", environment_id)
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }

    pub(crate) fn delete_url(&self, project_id: &str, environment_id: &str, build_id: &str) -> Result<Url> {
        self.endpoint(&format!(
            "projects/{}/environments/{}/builds/{}",
            urlencoding::encode(project_id),
            urlencoding::encode(environment_id),
            urlencoding::encode(build_id)
        ))
    }
}

impl BuildApi for CloudClient {
    /// Fetches builds for a project environment.
    ///
    /// A `limit` of zero or less falls back to [`DEFAULT_LIST_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the project or environment id is blank
    /// - the request fails or the API answers with a non-2xx status
    /// - the body is not JSON or carries no build array
    async fn list_builds(&self, project_id: &str, environment_id: &str, limit: i64) -> Result<Vec<Build>> {
        let project_id = require_non_blank(Some(project_id), "Project ID is required")?;
        let environment_id = require_non_blank(Some(environment_id), "Environment ID is required")?;

        let limit = if limit <= 0 { DEFAULT_LIST_LIMIT } else { limit };
        let url = self.list_url(project_id, environment_id, limit)?;
        debug!("GET {url}");

        let response = self
            .auth_request(self.client.get(url))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BuildToolError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let root: Value = serde_json::from_str(&body)?;
        let builds: Vec<Build> = extract_build_array(&root)?
            .iter()
            .map(|record| parse_build(record, &self.base_url))
            .collect();

        info!("Fetched {} builds for {project_id}/{environment_id}", builds.len());
        Ok(builds)
    }

    /// Deletes one build.
    ///
    /// Any HTTP answer yields an outcome; only transport failures are errors.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for blank ids and a network error when
    /// the request cannot be completed.
    async fn delete_build(&self, project_id: &str, environment_id: &str, build: &Build) -> Result<PruneOutcome> {
        let project_id = require_non_blank(Some(project_id), "Project ID is required")?;
        let environment_id = require_non_blank(Some(environment_id), "Environment ID is required")?;
        let build_id = require_non_blank(build.id.as_deref(), "Build ID is required")?;

        let url = self.delete_url(project_id, environment_id, build_id)?;
        debug!("DELETE {url}");

        let response = self
            .auth_request(self.client.delete(url))
            .send()
            .await?;

        outcome_from_response(build_id, response).await
    }
}

async fn outcome_from_response(build_id: &str, response: Response) -> Result<PruneOutcome> {
    let status = response.status();
    if status.is_success() {
        return Ok(PruneOutcome::deleted(build_id, status.as_u16()));
    }

    let body = response.text().await?;
    let message = extract_error_message(&body).unwrap_or_else(|| "Delete failed".to_string());
    Ok(PruneOutcome::failed(build_id, status.as_u16(), message))
}

/// Pulls a human-readable message out of an error body.
///
/// Prefers the JSON `message`, `error` or `detail` field; otherwise the
/// trimmed body itself. Blank bodies yield `None`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(trimmed).ok().and_then(|root| {
        ERROR_MESSAGE_KEYS.iter().find_map(|key| {
            root.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(ToString::to_string)
        })
    });

    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}

fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    Url::parse(&format!("{trimmed}/"))
        .map_err(|e| BuildToolError::config(format!("Invalid base URL: {e}")))
}
