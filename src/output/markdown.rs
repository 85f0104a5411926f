//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a run:
//! discovery statistics, the feed expansion outcome, and failed articles.

use crate::output::traits::{OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failed articles listed before the table is cut off
const MAX_LISTED_FAILURES: usize = 50;

/// Generates a markdown summary from run statistics
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Newsreap Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Discovery
    md.push_str("## Discovery\n\n");
    md.push_str(&format!(
        "- **Seeds**: {} ({} skipped)\n",
        summary.seeds_total, summary.seeds_skipped
    ));
    md.push_str(&format!(
        "- **Feed Expansion**: {} after {} reveals\n",
        summary.pagination_outcome, summary.reveals
    ));
    md.push_str(&format!(
        "- **URLs Discovered**: {} of {} requested\n\n",
        summary.urls_discovered, summary.article_cap
    ));

    // Extraction
    md.push_str("## Extraction\n\n");
    md.push_str("| Result | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Stored | {} |\n", summary.articles_stored()));
    md.push_str(&format!("| Failed | {} |\n\n", summary.failures.len()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    if !summary.failures.is_empty() {
        md.push_str("## Failed Articles\n\n");
        md.push_str("| Id | URL | Error |\n");
        md.push_str("|----|-----|-------|\n");

        for failure in summary.failures.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                failure.id,
                failure.url,
                failure.message.replace('|', "\\|")
            ));
        }
        if summary.failures.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    md
}
