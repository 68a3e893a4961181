use serde_json::Value;
use url::Url;

/// Resolves a `self`/`href` value into an absolute URL.
///
/// Absolute references are taken as-is; relative ones (e.g. `/v2/builds/42`)
/// are resolved against the API base URL.
pub fn resolve_link(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    match Url::parse(reference) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(reference).ok(),
        Err(_) => None,
    }
}

/// Finds the first resolvable `href` in a HAL-style `links` object.
///
/// Entries are visited in the order they appear in the response body, so
/// `{"links": {"self": {...}, "logs": {...}}}` always prefers `self`.
pub fn first_link_href(base: &Url, links: &Value) -> Option<Url> {
    links
        .as_object()?
        .values()
        .filter_map(|entry| entry.get("href").and_then(Value::as_str))
        .find_map(|href| resolve_link(base, href))
}
