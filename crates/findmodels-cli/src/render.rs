//! Plain-text status table.

use findmodels_core::paths::display_path;
use findmodels_core::presentation::{display_links, rank_rows};
use findmodels_core::{AnalysisSnapshot, DirectoryTable, LinkResult, ModelStatusRecord};
use std::fmt::Write;

fn link_cell(snapshot: &AnalysisSnapshot, record: &ModelStatusRecord) -> String {
    if record.installed {
        return String::new();
    }
    let key = record.key();
    if snapshot.is_pending(&key) {
        return "(searching)".to_string();
    }
    let links = display_links(snapshot.links(&key));
    match links.first() {
        Some(first) => describe_link(first, links.len()),
        None => "(no links found)".to_string(),
    }
}

fn describe_link(link: &LinkResult, total: usize) -> String {
    let target = link
        .download_url
        .as_deref()
        .or(link.url.as_deref())
        .unwrap_or_default();
    if total > 1 {
        format!("[{}] {} (+{} more)", link.source, target, total - 1)
    } else {
        format!("[{}] {}", link.source, target)
    }
}

/// Render a snapshot as a table, ranked by `query` when one is given.
pub fn render_table(
    snapshot: &AnalysisSnapshot,
    directories: &DirectoryTable,
    query: Option<&str>,
) -> String {
    let stats = snapshot.stats();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} required, {} installed, {} missing",
        stats.total, stats.installed, stats.missing
    );

    let rows = rank_rows(snapshot.models.values(), query.unwrap_or(""));
    let name_width = rows
        .iter()
        .map(|(record, _)| record.name.len())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut separated = false;
    for (record, _) in &rows {
        if !record.used && !separated {
            let _ = writeln!(out, "-- not used by active nodes --");
            separated = true;
        }
        let status = if record.installed { "ok" } else { "MISSING" };
        let location = display_path(record, directories).unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<7}  {:<name_width$}  {:<13}  {}{}",
            status,
            record.name,
            record.category.label(),
            location,
            link_cell(snapshot, record),
        );
    }
    out
}
