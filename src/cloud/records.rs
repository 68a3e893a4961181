//! Normalization of loosely-shaped build records.
//!
//! Different API versions name the same attribute differently, so each field
//! is read from an ordered list of candidate keys.

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;
use url::Url;

use super::links::{first_link_href, resolve_link};
use super::types::Build;
use crate::error::{BuildToolError, Result};
use crate::time::parse_instant;

/// Keys under which a response object may carry the build array.
const ARRAY_KEYS: [&str; 4] = ["builds", "items", "data", "results"];

const ID_KEYS: &[&str] = &["id", "buildId", "code"];
const CODE_KEYS: &[&str] = &["code", "name", "buildCode"];
const BRANCH_KEYS: &[&str] = &["branch", "branchName", "branchId"];
const CREATED_KEYS: &[&str] = &["createdAt", "creationTime", "created", "created_on"];
const LAST_USED_KEYS: &[&str] = &["lastUsedAt", "lastUsage", "last_used_at", "lastUsed"];
const STATUS_KEYS: &[&str] = &["status", "state"];
const DELETABLE_KEYS: &[&str] = &["deletable", "deleteAllowed", "deleteEnabled", "canBeDeleted"];
const REASON_KEYS: &[&str] = &["deleteReason", "reason", "message"];
const SELF_KEYS: &[&str] = &["self", "href", "url"];

/// Locates the build array in a list response.
///
/// # Errors
///
/// Returns [`BuildToolError::NoBuildsArray`] when neither the root nor any
/// of the known wrapper keys holds an array.
pub fn extract_build_array(root: &Value) -> Result<&Vec<Value>> {
    if let Some(items) = root.as_array() {
        return Ok(items);
    }

    ARRAY_KEYS
        .iter()
        .find_map(|key| root.get(key).and_then(Value::as_array))
        .ok_or(BuildToolError::NoBuildsArray)
}

/// Returns the first value among `keys` that `parse` accepts.
pub fn probe<'a, T>(
    record: &'a Value,
    keys: &[&str],
    parse: impl Fn(&'a Value) -> Option<T>,
) -> Option<T> {
    keys.iter()
        .filter_map(|key| record.get(key))
        .find_map(parse)
}

/// Non-blank strings, plus numbers rendered as text (numeric build ids).
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn instant(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_instant)
}

/// Interprets a deletability flag. Unrecognized values count as `false`.
pub fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i != 0)
            .or_else(|| n.as_u64().map(|u| u != 0))
            .unwrap_or(false),
        _ => false,
    }
}

/// Builds a [`Build`] from one API record, resolving relative links against `base`.
pub fn parse_build(record: &Value, base: &Url) -> Build {
    let self_link = probe(record, SELF_KEYS, |v| {
        v.as_str().and_then(|href| resolve_link(base, href))
    })
    .or_else(|| {
        record
            .get("links")
            .and_then(|links| first_link_href(base, links))
    });

    // The first deletability key present decides, whatever its value.
    let deletable = DELETABLE_KEYS
        .iter()
        .find_map(|key| record.get(key))
        .is_some_and(flag);

    let build = Build {
        id: probe(record, ID_KEYS, text),
        code: probe(record, CODE_KEYS, text),
        branch: probe(record, BRANCH_KEYS, text),
        created_at: probe(record, CREATED_KEYS, instant),
        last_used_at: probe(record, LAST_USED_KEYS, instant),
        status: probe(record, STATUS_KEYS, text),
        deletable,
        delete_reason: probe(record, REASON_KEYS, text),
        self_link,
        raw: record.clone(),
    };

    if build.id.is_none() {
        debug!("Build record without an identifier: {record}");
    }

    build
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("https://portal.example.com/v2/").unwrap()
    }

    mod extract_build_array {
        use super::*;

        #[test]
        fn uses_bare_array() {
            let root = json!([{"id": "1"}, {"id": "2"}]);
            assert_eq!(extract_build_array(&root).unwrap().len(), 2);
        }

        #[test]
        fn finds_wrapped_arrays() {
            for key in ["builds", "items", "data", "results"] {
                let root = json!({ key: [{"id": "1"}] });
                assert_eq!(extract_build_array(&root).unwrap().len(), 1, "key {key}");
            }
        }

        #[test]
        fn first_wrapper_key_wins() {
            let root = json!({"results": [1, 2, 3], "builds": [1]});
            assert_eq!(extract_build_array(&root).unwrap().len(), 1);
        }

        #[test]
        fn skips_non_array_wrappers() {
            let root = json!({"builds": {"count": 3}, "items": [1, 2]});
            assert_eq!(extract_build_array(&root).unwrap().len(), 2);
        }

        #[test]
        fn fails_without_known_key() {
            let root = json!({"content": [{"id": "1"}]});
            assert!(matches!(
                extract_build_array(&root),
                Err(BuildToolError::NoBuildsArray)
            ));
        }
    }

    mod parse_build {
        use super::*;

        #[test]
        fn reads_primary_keys() {
            let record = json!({
                "id": "b-1",
                "code": "20240501.1",
                "branch": "main",
                "createdAt": "2024-05-01T10:00:00Z",
                "lastUsedAt": "2024-05-02T10:00:00Z",
                "status": "SUCCESS",
                "deletable": true,
                "deleteReason": "",
                "self": "https://portal.example.com/v2/builds/b-1"
            });
            let build = parse_build(&record, &base());

            assert_eq!(build.id.as_deref(), Some("b-1"));
            assert_eq!(build.code.as_deref(), Some("20240501.1"));
            assert_eq!(build.branch.as_deref(), Some("main"));
            assert_eq!(
                build.created_at,
                Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
            );
            assert_eq!(
                build.last_used_at,
                Some(Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap())
            );
            assert_eq!(build.status.as_deref(), Some("SUCCESS"));
            assert!(build.deletable);
            assert_eq!(build.delete_reason, None);
            assert_eq!(
                build.self_link.unwrap().as_str(),
                "https://portal.example.com/v2/builds/b-1"
            );
            assert_eq!(build.raw, record);
        }

        #[test]
        fn falls_back_to_alternate_keys() {
            let record = json!({
                "buildId": "b-2",
                "name": "nightly",
                "branchName": "develop",
                "creationTime": "2024-05-01T12:00:00+02:00",
                "last_used_at": "2024-05-03T00:00:00Z",
                "state": "FAIL",
                "deleteAllowed": "yes",
                "reason": "kept for audit",
                "href": "builds/b-2"
            });
            let build = parse_build(&record, &base());

            assert_eq!(build.id.as_deref(), Some("b-2"));
            assert_eq!(build.code.as_deref(), Some("nightly"));
            assert_eq!(build.branch.as_deref(), Some("develop"));
            assert_eq!(
                build.created_at,
                Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
            );
            assert!(build.last_used_at.is_some());
            assert_eq!(build.status.as_deref(), Some("FAIL"));
            assert!(build.deletable);
            assert_eq!(build.delete_reason.as_deref(), Some("kept for audit"));
            assert_eq!(
                build.self_link.unwrap().as_str(),
                "https://portal.example.com/v2/builds/b-2"
            );
        }

        #[test]
        fn every_text_key_is_recognized() {
            let fields: [(&[&str], fn(&Build) -> Option<&str>); 5] = [
                (ID_KEYS, |b| b.id.as_deref()),
                (CODE_KEYS, |b| b.code.as_deref()),
                (BRANCH_KEYS, |b| b.branch.as_deref()),
                (STATUS_KEYS, |b| b.status.as_deref()),
                (REASON_KEYS, |b| b.delete_reason.as_deref()),
            ];

            for (keys, field) in fields {
                for key in keys {
                    let build = parse_build(&json!({ *key: "value" }), &base());
                    assert_eq!(field(&build), Some("value"), "key {key}");
                }
            }
        }

        #[test]
        fn every_timestamp_key_is_recognized() {
            let expected = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
            let fields: [(&[&str], fn(&Build) -> Option<DateTime<Utc>>); 2] = [
                (CREATED_KEYS, |b| b.created_at),
                (LAST_USED_KEYS, |b| b.last_used_at),
            ];

            for (keys, field) in fields {
                for key in keys {
                    let build = parse_build(&json!({ *key: "2024-05-01T12:00:00Z" }), &base());
                    assert_eq!(field(&build), expected, "key {key}");
                }
            }
        }

        #[test]
        fn every_deletable_key_is_recognized() {
            for key in DELETABLE_KEYS {
                assert!(parse_build(&json!({ *key: true }), &base()).deletable, "key {key}");
                assert!(!parse_build(&json!({ *key: false }), &base()).deletable, "key {key}");
            }
        }

        #[test]
        fn every_self_key_is_recognized() {
            for key in SELF_KEYS {
                let build = parse_build(&json!({ *key: "builds/b-9" }), &base());
                assert_eq!(
                    build.self_link.map(String::from).as_deref(),
                    Some("https://portal.example.com/v2/builds/b-9"),
                    "key {key}"
                );
            }
        }

        #[test]
        fn id_falls_back_to_code() {
            let build = parse_build(&json!({"code": "20240501.7"}), &base());
            assert_eq!(build.id.as_deref(), Some("20240501.7"));
            assert_eq!(build.display_name(), "20240501.7");
        }

        #[test]
        fn blank_values_are_skipped() {
            let record = json!({"id": "  ", "buildId": "b-3", "status": "", "state": "BUILDING"});
            let build = parse_build(&record, &base());
            assert_eq!(build.id.as_deref(), Some("b-3"));
            assert_eq!(build.status.as_deref(), Some("BUILDING"));
        }

        #[test]
        fn numeric_ids_are_rendered_as_text() {
            let build = parse_build(&json!({"id": 1234}), &base());
            assert_eq!(build.id.as_deref(), Some("1234"));
        }

        #[test]
        fn unparsable_timestamp_tries_next_key() {
            let record = json!({
                "createdAt": "last tuesday",
                "created": "2024-01-01T00:00:00Z"
            });
            let build = parse_build(&record, &base());
            assert_eq!(
                build.created_at,
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            );
        }

        #[test]
        fn unparsable_timestamps_become_unknown() {
            let build = parse_build(&json!({"id": "x", "createdAt": "soon"}), &base());
            assert_eq!(build.created_at, None);
        }

        #[test]
        fn links_object_is_the_last_resort() {
            let record = json!({
                "id": "b-4",
                "links": {
                    "self": {"href": "https://portal.example.com/v2/builds/b-4"},
                    "logs": {"href": "https://portal.example.com/v2/builds/b-4/logs"}
                }
            });
            let build = parse_build(&record, &base());
            assert_eq!(
                build.self_link.unwrap().as_str(),
                "https://portal.example.com/v2/builds/b-4"
            );
        }

        #[test]
        fn missing_everything_still_builds() {
            let build = parse_build(&json!({}), &base());
            assert_eq!(build.id, None);
            assert!(!build.deletable);
            assert_eq!(build.display_name(), "<unknown>");
        }
    }

    mod deletable {
        use super::*;

        #[test]
        fn interprets_flag_values() {
            let cases = [
                (json!(true), true),
                (json!(false), false),
                (json!("TRUE"), true),
                (json!("Yes"), true),
                (json!("no"), false),
                (json!("False"), false),
                (json!(1), true),
                (json!(0), false),
                (json!(-3), true),
                (json!("maybe"), false),
                (Value::Null, false),
            ];
            for (value, expected) in cases {
                assert_eq!(flag(&value), expected, "value {value}");
            }
        }

        #[test]
        fn first_present_key_decides() {
            let record = json!({"deleteAllowed": false, "canBeDeleted": true});
            assert!(!parse_build(&record, &base()).deletable);

            let record = json!({"deleteEnabled": 1, "canBeDeleted": false});
            assert!(parse_build(&record, &base()).deletable);
        }

        #[test]
        fn defaults_to_not_deletable() {
            assert!(!parse_build(&json!({"id": "x"}), &base()).deletable);
        }
    }
}
