//! Terminal rendering for sample listings and reports

use console::Style;
use lazyqlib::{Grouping, OutputFormat, Sample, SampleInfo, SampleReport};
use serde::Serialize;

/// One category of the listing, as written in JSON mode
#[derive(Debug, Serialize)]
struct CategoryListing {
    category: &'static str,
    samples: Vec<SampleInfo>,
}

fn heading_style() -> Style {
    Style::new().bold()
}

fn note_style() -> Style {
    Style::new().dim()
}

/// Render the sample catalog grouped by category.
pub fn render_listing(
    groups: &[Grouping<&'static str, &'static Sample>],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => {
            let listing: Vec<CategoryListing> = groups
                .iter()
                .map(|group| CategoryListing {
                    category: *group.key(),
                    samples: group.iter().map(|sample| sample.info()).collect(),
                })
                .collect();
            Ok(format!("{}\n", serde_json::to_string_pretty(&listing)?))
        }
        OutputFormat::Table => {
            let heading = heading_style();
            let note = note_style();
            let mut out = String::new();
            for group in groups {
                out.push_str(&format!("{}\n", heading.apply_to(group.key())));
                for sample in group {
                    out.push_str(&format!(
                        "  {:<8} {}  {}\n",
                        sample.id,
                        sample.title,
                        note.apply_to(sample.description)
                    ));
                }
            }
            Ok(out)
        }
    }
}

/// Render sample reports: a title per report followed by one compact JSON
/// row per line, or the whole batch as a JSON array.
pub fn render_reports(
    reports: &[SampleReport],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(reports)?)),
        OutputFormat::Table => {
            let heading = heading_style();
            let note = note_style();
            let mut blocks = Vec::with_capacity(reports.len());
            for report in reports {
                let mut block = format!(
                    "{}\n",
                    heading.apply_to(format!("{} ({})", report.title, report.id))
                );
                for row in &report.rows {
                    block.push_str(&serde_json::to_string(row)?);
                    block.push('\n');
                }
                if report.rows.is_empty() {
                    block.push_str(&format!("{}\n", note.apply_to("(no rows)")));
                }
                if report.truncated {
                    block.push_str(&format!(
                        "{}\n",
                        note.apply_to(format!("... truncated after {} rows", report.rows.len()))
                    ));
                }
                blocks.push(block);
            }
            Ok(blocks.join("\n"))
        }
    }
}
