mod client;
mod links;
mod records;
mod types;

pub use client::{CloudClient, DEFAULT_LIST_LIMIT};
pub use types::{Build, PruneOutcome};

#[cfg(test)]
pub(crate) use types::fixtures;

use crate::error::Result;

/// Operations the list and prune commands need from the build API.
#[allow(async_fn_in_trait)]
pub trait BuildApi {
    async fn list_builds(&self, project_id: &str, environment_id: &str, limit: i64) -> Result<Vec<Build>>;

    async fn delete_build(&self, project_id: &str, environment_id: &str, build: &Build) -> Result<PruneOutcome>;
}
