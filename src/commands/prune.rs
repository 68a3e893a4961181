use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};

use super::{CommandStatus, Target};
use crate::cancel::CancelFlag;
use crate::cloud::{Build, BuildApi, PruneOutcome};
use crate::error::BuildToolError;
use crate::output::{
    render_build_table, render_dry_run_header, DeleteProgress, FetchProgress, PruneReport,
};
use crate::time::{format_relative, parse_duration};

pub const DEFAULT_PRUNE_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// Retention expression, e.g. `30d` or `P2DT3H`
    pub older_than: String,
    /// Number of builds to inspect
    pub limit: i64,
    /// Maximum deletions; `None` means unlimited
    pub max: Option<usize>,
    pub dry_run: bool,
}

/// Maps the `--max` value to a cap; negative means unlimited.
pub fn deletion_cap(max: i64) -> Option<usize> {
    usize::try_from(max).ok()
}

/// What a prune run decided or did.
#[derive(Debug)]
pub enum PruneRun {
    NoCandidates,
    DryRun(Vec<Build>),
    Completed(PruneReport),
}

/// Computes `now - older_than`.
///
/// # Errors
///
/// Returns a configuration error for an unreadable expression or one that
/// reaches before the representable range.
pub fn cutoff_for(older_than: &str, now: DateTime<Utc>) -> crate::error::Result<DateTime<Utc>> {
    let retention = parse_duration(older_than)?;
    now.checked_sub_signed(retention)
        .ok_or_else(|| BuildToolError::config(format!("Retention period is too large: {older_than}")))
}

/// Deletable builds created strictly before `cutoff`, oldest first.
pub fn select_candidates(builds: Vec<Build>, cutoff: DateTime<Utc>) -> Vec<Build> {
    let mut candidates: Vec<Build> = builds
        .into_iter()
        .filter(|b| b.deletable && b.is_older_than(cutoff))
        .collect();
    candidates.sort_by_key(|b| b.created_at);
    candidates
}

/// Deletes candidates one at a time, in order, up to `max`.
///
/// A failed delete is recorded and the loop moves on. Once `cancel` is set,
/// the next candidate is recorded as interrupted and nothing further is
/// attempted.
pub async fn delete_candidates<A: BuildApi>(
    api: &A,
    target: &Target,
    candidates: &[Build],
    max: Option<usize>,
    cancel: &CancelFlag,
    mut on_outcome: impl FnMut(&PruneOutcome),
) -> Vec<PruneOutcome> {
    let count = max.map_or(candidates.len(), |max| max.min(candidates.len()));
    let mut outcomes = Vec::with_capacity(count);

    for build in &candidates[..count] {
        let build_id = build.id.clone().unwrap_or_else(|| build.display_name().to_string());

        if cancel.is_cancelled() {
            warn!("Prune interrupted before deleting {build_id}");
            let outcome = PruneOutcome::interrupted(build_id);
            on_outcome(&outcome);
            outcomes.push(outcome);
            break;
        }

        let outcome = match api
            .delete_build(&target.project_id, &target.environment_id, build)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => PruneOutcome::failed(build_id, 0, e.detailed()),
        };

        if outcome.deleted {
            info!(
                "Deleted build {} (created {})",
                outcome.build_id,
                format_relative(build.created_at)
            );
        } else {
            warn!(
                "Failed to delete build {}: {} (status {})",
                outcome.build_id, outcome.message, outcome.status_code
            );
        }

        on_outcome(&outcome);
        outcomes.push(outcome);
    }

    outcomes
}

/// Deletes already selected `candidates` unless this is a dry run.
pub async fn prune_builds<A: BuildApi>(
    api: &A,
    target: &Target,
    candidates: Vec<Build>,
    options: &PruneOptions,
    cancel: &CancelFlag,
    on_outcome: impl FnMut(&PruneOutcome),
) -> PruneRun {
    if candidates.is_empty() {
        return PruneRun::NoCandidates;
    }
    if options.dry_run {
        return PruneRun::DryRun(candidates);
    }

    let outcomes = delete_candidates(api, target, &candidates, options.max, cancel, on_outcome).await;
    PruneRun::Completed(PruneReport::new(outcomes))
}

pub async fn execute<A: BuildApi>(
    api: &A,
    target: &Target,
    options: &PruneOptions,
    cancel: &CancelFlag,
) -> Result<CommandStatus> {
    let now = Utc::now();
    let cutoff = cutoff_for(&options.older_than, now)?;
    info!(
        "Pruning builds in {}/{} older than {} (cutoff {cutoff})",
        target.project_id, target.environment_id, options.older_than
    );

    let progress = FetchProgress::start(options.limit);
    let fetched = tokio::select! {
        fetched = api.list_builds(&target.project_id, &target.environment_id, options.limit) => fetched,
        () = cancel.cancelled() => {
            progress.abandon();
            return Err(anyhow!("Interrupted while fetching builds; nothing was deleted"));
        }
    };
    let builds = match fetched {
        Ok(builds) => {
            progress.finish(builds.len());
            builds
        }
        Err(e) => {
            progress.abandon();
            return Err(e).context("Failed to prune builds");
        }
    };

    let candidates = select_candidates(builds, cutoff);
    info!("{} builds created before {cutoff} can be deleted", candidates.len());

    let planned = candidates.len();
    let progress = (!options.dry_run && planned > 0)
        .then(|| DeleteProgress::start(options.max.map_or(planned, |max| max.min(planned))));

    let run = prune_builds(api, target, candidates, options, cancel, |outcome| {
        if let Some(progress) = &progress {
            progress.record(outcome);
        }
    })
    .await;
    if let Some(progress) = progress {
        progress.finish();
    }

    match run {
        PruneRun::NoCandidates => {
            println!("No builds matched the prune criteria.");
            Ok(CommandStatus::Success)
        }
        PruneRun::DryRun(candidates) => {
            println!("{}", render_dry_run_header(candidates.len(), &options.older_than));
            println!("{}", render_build_table(&candidates, now));
            Ok(CommandStatus::Success)
        }
        PruneRun::Completed(report) => {
            println!("{}", report.render());
            if report.is_success() {
                Ok(CommandStatus::Success)
            } else {
                Ok(CommandStatus::PartialFailure)
            }
        }
    }
}
