//! Terminal output for the CLI.

use console::{Emoji, style};
use std::fmt::Write as _;

use crate::purge::PurgeStats;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static TRASH: Emoji<'_, '_> = Emoji("🗑️  ", "-");

/// Render the end-of-run summary.
pub fn render_summary(stats: &PurgeStats, dry_run: bool) -> String {
    let mut out = String::new();
    let title = if dry_run {
        "Purge summary (dry run)"
    } else {
        "Purge summary"
    };
    let deleted_label = if dry_run { "Would delete" } else { "Deleted" };

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style(title).bold());
    let _ = writeln!(out, "{}", "=".repeat(title.len()));
    let _ = writeln!(out, "  Communities processed: {}", stats.communities_processed);
    let _ = writeln!(out, "  DM channels processed: {}", stats.channels_processed);
    let _ = writeln!(
        out,
        "  {}{}: {}",
        TRASH,
        deleted_label,
        style(stats.messages_deleted).green()
    );
    let _ = writeln!(out, "  Skipped: {}", style(stats.messages_skipped).yellow());
    let _ = writeln!(out, "  Failed: {}", style(stats.messages_failed).red());

    if !stats.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}Errors:", WARN);
        for error in &stats.errors {
            let _ = writeln!(out, "  - {}", error);
        }
    }

    let _ = writeln!(out);
    if stats.has_failures() {
        let _ = writeln!(
            out,
            "{}{}",
            CROSS,
            style(format!("{} message(s) could not be deleted", stats.messages_failed)).red()
        );
    } else {
        let _ = writeln!(out, "{}{}", CHECK, style("Done").green());
    }
    out
}

pub fn print_summary(stats: &PurgeStats, dry_run: bool) {
    print!("{}", render_summary(stats, dry_run));
}
