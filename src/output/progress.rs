use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::Tone;
use crate::cloud::PruneOutcome;

/// Spinner shown on stderr while the build list is being fetched.
pub struct FetchProgress {
    pb: ProgressBar,
}

impl FetchProgress {
    pub fn start(limit: i64) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(Tone::Pending.paint(format!("Fetching builds (limit: {limit})")).to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self, count: usize) {
        self.pb
            .finish_with_message(Tone::Success.paint(format!("Fetched {count} builds ✓")).to_string());
    }

    pub fn abandon(self) {
        self.pb.finish_and_clear();
    }
}

/// Progress bar over the delete loop, one tick per attempt.
pub struct DeleteProgress {
    pb: ProgressBar,
}

impl DeleteProgress {
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb.set_message(Tone::Pending.paint("Deleting builds").to_string());
        Self { pb }
    }

    pub fn record(&self, outcome: &PruneOutcome) {
        if !outcome.deleted {
            self.pb.println(format!(
                "  failed to delete {}: {}",
                outcome.build_id, outcome.message
            ));
        }
        self.pb.inc(1);
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}
