use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::cloud::Build;
use crate::time::{format_instant, format_relative_at};

const BUILD_HEADERS: [&str; 7] = ["ID", "Code", "Branch", "Created", "Age", "Status", "Deletable"];

/// Table with the house style. Columns are as wide as their widest cell,
/// header included, and never wrap.
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Disabled);
    table
}

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn value_or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "-",
    }
}

fn deletable_cell(deletable: bool) -> Cell {
    if deletable {
        Cell::new("yes").fg(TableColor::Green)
    } else {
        Cell::new("no").fg(TableColor::Red)
    }
}

/// Orders builds oldest first; builds without a creation time go last.
fn sort_by_creation(builds: &mut [&Build]) {
    builds.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Renders builds as a table sorted by creation time, ages relative to `now`.
pub fn render_build_table(builds: &[Build], now: DateTime<Utc>) -> String {
    if builds.is_empty() {
        return "No builds found.".to_string();
    }

    let mut sorted: Vec<&Build> = builds.iter().collect();
    sort_by_creation(&mut sorted);

    let mut table = create_table();
    table.set_header(create_cyan_header(&BUILD_HEADERS));

    for build in sorted {
        table.add_row(vec![
            Cell::new(value_or_dash(build.id.as_deref())),
            Cell::new(value_or_dash(build.code.as_deref())),
            Cell::new(value_or_dash(build.branch.as_deref())),
            Cell::new(format_instant(build.created_at)),
            Cell::new(format_relative_at(build.created_at, now)),
            Cell::new(value_or_dash(build.status.as_deref())),
            deletable_cell(build.deletable),
        ]);
    }

    table.to_string()
}
