use std::fmt::Write;

use super::styling::Tone;
use crate::cloud::PruneOutcome;
use crate::time::pluralize;

/// Aggregated result of a prune run.
#[derive(Debug, Default)]
pub struct PruneReport {
    pub outcomes: Vec<PruneOutcome>,
}

impl PruneReport {
    pub fn new(outcomes: Vec<PruneOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn deleted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.deleted).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.deleted_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PruneOutcome> {
        self.outcomes.iter().filter(|o| !o.deleted)
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// `Deleted N builds (M failures).` followed by one line per failure.
    pub fn render(&self) -> String {
        let deleted = self.deleted_count();
        let failed = self.failed_count();

        #[allow(clippy::cast_possible_wrap)]
        let mut output = format!(
            "Deleted {} {}",
            deleted,
            pluralize("build", deleted as i64)
        );
        if failed > 0 {
            #[allow(clippy::cast_possible_wrap)]
            let failures = format!("{failed} {}", pluralize("failure", failed as i64));
            let _ = write!(output, " ({failures})");
        }
        output.push('.');

        let mut output = Tone::for_failures(failed).paint(output).to_string();

        for outcome in self.failures() {
            let _ = write!(
                output,
                "\n{}",
                Tone::Failure.paint(format!(
                    "- {}: {} (status {})",
                    outcome.build_id, outcome.message, outcome.status_code
                ))
            );
        }

        output
    }
}

/// Header line for a dry run.
pub fn render_dry_run_header(count: usize, older_than: &str) -> String {
    #[allow(clippy::cast_possible_wrap)]
    let noun = pluralize("build", count as i64);
    format!("[dry-run] {count} {noun} would be deleted (older than {older_than}).")
}
