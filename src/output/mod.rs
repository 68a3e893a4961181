mod progress;
mod report;
mod styling;
mod tables;

pub use progress::{DeleteProgress, FetchProgress};
pub use report::{render_dry_run_header, PruneReport};
pub use styling::Tone;
pub use tables::render_build_table;

/// Prints the ccbuild banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        Tone::Brand.paint("🧹 ccbuild"),
        Tone::Muted.paint(env!("CARGO_PKG_VERSION")),
        Tone::Muted.paint("Commerce Cloud build pruner")
    );
}
