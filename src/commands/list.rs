use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};

use super::{CommandStatus, Target};
use crate::cloud::{Build, BuildApi};
use crate::output::{render_build_table, FetchProgress};

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub limit: i64,
    pub include_non_deletable: bool,
    pub json: bool,
}

/// Drops builds that cannot be deleted unless asked to keep them.
pub fn filter_listing(builds: Vec<Build>, include_non_deletable: bool) -> Vec<Build> {
    if include_non_deletable {
        builds
    } else {
        builds
            .into_iter()
            .filter(|b| {
                if !b.deletable {
                    debug!("Hiding {}: {}", b.display_name(), b.effective_delete_reason());
                }
                b.deletable
            })
            .collect()
    }
}

/// Renders the listing as a table or as a pretty-printed JSON array.
pub fn render_listing(builds: &[Build], json: bool, now: DateTime<Utc>) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(builds)?)
    } else {
        Ok(render_build_table(builds, now))
    }
}

pub async fn execute<A: BuildApi>(api: &A, target: &Target, options: &ListOptions) -> Result<CommandStatus> {
    info!(
        "Listing builds for {}/{}",
        target.project_id, target.environment_id
    );

    let progress = FetchProgress::start(options.limit);
    let builds = match api
        .list_builds(&target.project_id, &target.environment_id, options.limit)
        .await
    {
        Ok(builds) => {
            progress.finish(builds.len());
            builds
        }
        Err(e) => {
            progress.abandon();
            return Err(e).context("Failed to list builds");
        }
    };

    let builds = filter_listing(builds, options.include_non_deletable);
    println!("{}", render_listing(&builds, options.json, Utc::now())?);

    Ok(CommandStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fixtures::build;
    use crate::commands::fake::FakeApi;
    use crate::error::BuildToolError;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn target() -> Target {
        Target {
            project_id: "proj".to_string(),
            environment_id: "d1".to_string(),
        }
    }

    #[test]
    fn hides_non_deletable_by_default() {
        let builds = vec![build("a", true, None), build("b", false, None)];
        let filtered = filter_listing(builds.clone(), false);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.as_deref(), Some("a"));

        assert_eq!(filter_listing(builds, true).len(), 2);
    }

    #[test]
    fn json_listing_keeps_raw_record() {
        let mut b = build("a", true, Some(now() - Duration::days(2)));
        b.raw = serde_json::json!({"id": "a", "extra": {"nested": 1}});

        let rendered = render_listing(&[b], true, now()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert!(parsed.is_array());
        assert_eq!(parsed[0]["id"], "a");
        assert_eq!(parsed[0]["raw"]["extra"]["nested"], 1);
        assert_eq!(parsed[0]["createdAt"], "2024-12-30T00:00:00Z");
    }

    #[test]
    fn table_listing_of_nothing() {
        assert_eq!(render_listing(&[], false, now()).unwrap(), "No builds found.");
    }

    #[test]
    fn json_listing_of_nothing_is_empty_array() {
        assert_eq!(render_listing(&[], true, now()).unwrap(), "[]");
    }

    #[tokio::test]
    async fn execute_passes_limit_through() {
        let api = FakeApi::with_builds(vec![build("a", true, None)]);
        let options = ListOptions {
            limit: 25,
            include_non_deletable: false,
            json: true,
        };

        let status = execute(&api, &target(), &options).await.unwrap();
        assert_eq!(status, CommandStatus::Success);
        assert_eq!(*api.list_calls.lock().unwrap(), vec![25]);
    }

    #[tokio::test]
    async fn execute_wraps_fetch_errors() {
        struct Failing;
        impl BuildApi for Failing {
            async fn list_builds(&self, _: &str, _: &str, _: i64) -> crate::error::Result<Vec<Build>> {
                Err(BuildToolError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })
            }
            async fn delete_build(
                &self,
                _: &str,
                _: &str,
                _: &Build,
            ) -> crate::error::Result<crate::cloud::PruneOutcome> {
                unreachable!("listing never deletes")
            }
        }

        let options = ListOptions {
            limit: 10,
            include_non_deletable: true,
            json: false,
        };
        let err = execute(&Failing, &target(), &options).await.unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "Failed to list builds: Failed to fetch builds (status 500): boom"
        );
    }
}
