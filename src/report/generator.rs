//! Payload rendering.
//!
//! This module renders an assembled payload either as the pretty JSON
//! consumed by the chart front-end or as a human-readable Markdown report.

use crate::models::{
    Distribution, Efficiency, EfficiencyPoint, Evolution, Marquee, PayloadMeta, Report,
    ReportMetadata, Role,
};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Number of entities listed in the efficiency table.
const TOP_ENTITIES: usize = 10;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let payload = &report.payload;
    let mut output = String::new();

    // Title
    output.push_str("# Grammy Charts Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata, &payload.meta));
    output.push_str(&generate_roles_section(&payload.meta));
    output.push_str(&generate_distribution_section(&payload.polar));
    output.push_str(&generate_evolution_section(&payload.evolution));
    output.push_str(&generate_efficiency_section(&payload.scatter));
    output.push_str(&generate_marquee_section(&payload.big4));
    output.push_str(&generate_degraded_section(&payload.meta.degraded));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, meta: &PayloadMeta) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Rows:** {}\n", meta.row_count));
    section.push_str(&format!("- **Columns:** {}\n", meta.column_names.len()));
    section.push_str(&format!("- **Years:** {}\n", meta.year_range));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the resolved column table.
fn generate_roles_section(meta: &PayloadMeta) -> String {
    let mut section = String::new();

    section.push_str("## Resolved Columns\n\n");
    section.push_str("| Role | Column |\n");
    section.push_str("|:---|:---|\n");

    for role in Role::ALL {
        let column = match meta.roles.get(role) {
            Some(name) => format!("`{}`", name),
            None => "_unresolved_".to_string(),
        };
        section.push_str(&format!("| {} | {} |\n", role, column));
    }
    if let Some(ref award) = meta.roles.award {
        section.push_str(&format!("| award | `{}` |\n", award));
    }
    section.push('\n');

    section
}

/// Generate the category distribution section.
fn generate_distribution_section(polar: &Distribution) -> String {
    let mut section = String::new();

    section.push_str("## Category Distribution\n\n");

    if polar.labels.is_empty() {
        section.push_str("No rows to chart.\n\n");
        return section;
    }

    section.push_str("| Category | Rows |\n");
    section.push_str("|:---|:---:|\n");
    for (label, count) in polar.labels.iter().zip(&polar.counts) {
        section.push_str(&format!("| {} | {} |\n", escape_cell(label), count));
    }
    section.push('\n');

    section
}

/// Generate the per-year summary of the evolution matrix.
fn generate_evolution_section(evolution: &Evolution) -> String {
    let mut section = String::new();

    section.push_str("## Evolution\n\n");

    if evolution.labels.is_empty() {
        section.push_str("No year column was resolved, or the dataset is empty.\n\n");
        return section;
    }

    section.push_str(&format!(
        "{} categories across {} year buckets ({} to {}).\n\n",
        evolution.datasets.len(),
        evolution.labels.len(),
        evolution.labels[0],
        evolution.labels[evolution.labels.len() - 1]
    ));

    section.push_str("| Year | Rows | Categories |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for (idx, year) in evolution.labels.iter().enumerate() {
        let counts = evolution.datasets.iter().map(|s| s.data[idx]);
        let total: usize = counts.clone().sum();
        let active = counts.filter(|c| *c > 0).count();
        section.push_str(&format!("| {} | {} | {} |\n", year, total, active));
    }
    section.push('\n');

    section
}

/// Generate the win efficiency section.
fn generate_efficiency_section(scatter: &Efficiency) -> String {
    let mut section = String::new();

    section.push_str("## Win Efficiency\n\n");

    if scatter.points.is_empty() {
        section.push_str("No entities to chart.\n\n");
        return section;
    }

    let mut points: Vec<&EfficiencyPoint> = scatter.points.iter().collect();
    points.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.nominations.cmp(&a.nominations))
    });

    section.push_str(&format!(
        "Top {} of {} entities by wins.\n\n",
        points.len().min(TOP_ENTITIES),
        points.len()
    ));
    section.push_str("| Entity | Nominations | Wins | Efficiency |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for point in points.into_iter().take(TOP_ENTITIES) {
        section.push_str(&format!(
            "| {} | {} | {} | {:.2}% |\n",
            escape_cell(&point.entity),
            point.nominations,
            point.wins,
            point.efficiency_pct
        ));
    }
    section.push('\n');

    section
}

/// Generate the marquee winners section.
fn generate_marquee_section(big4: &Marquee) -> String {
    let mut section = String::new();

    section.push_str("## Marquee Category Winners\n\n");

    if big4.is_placeholder() {
        section.push_str("No marquee category wins could be counted.\n\n");
        return section;
    }

    section.push_str("| Entity | Wins |\n");
    section.push_str("|:---|:---:|\n");
    for (label, count) in big4.labels.iter().zip(&big4.counts) {
        section.push_str(&format!("| {} | {} |\n", escape_cell(label), count));
    }
    section.push('\n');

    section
}

/// List sections that fell back to their empty shape.
fn generate_degraded_section(degraded: &[String]) -> String {
    if degraded.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Degraded Sections\n\n");
    section.push_str("These sections failed during aggregation and were replaced by empty results:\n\n");
    for name in degraded {
        section.push_str(&format!("- `{}`\n", name));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by grammy-charts v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the JSON chart payload.
pub fn generate_json_payload(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(&report.payload).map_err(Into::into)
}

/// Write rendered output to a file, or to stdout for `-`.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    if path == Path::new("-") {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.write_all(b"\n")?;
        return Ok(());
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvolutionSeries, Payload, RoleMapping};
    use chrono::Utc;

    fn create_test_report() -> Report {
        let metadata = ReportMetadata {
            source: "data/grammys.csv".to_string(),
            generated_at: Utc::now(),
            duration_seconds: 1.5,
        };

        let payload = Payload {
            polar: Distribution {
                labels: vec!["Album Of The Year".to_string(), "Best Rock | Metal".to_string()],
                counts: vec![3, 1],
            },
            evolution: Evolution {
                labels: vec!["1999".to_string(), "2000".to_string(), "Unknown".to_string()],
                datasets: vec![
                    EvolutionSeries::new("Album Of The Year".to_string(), vec![1, 2, 0], "#ff6384"),
                    EvolutionSeries::new("Best Rock | Metal".to_string(), vec![0, 0, 1], "#36a2eb"),
                ],
            },
            scatter: Efficiency {
                points: vec![
                    EfficiencyPoint {
                        entity: "Taylor Swift".to_string(),
                        nominations: 2,
                        wins: 1,
                        efficiency_pct: 50.0,
                        size_hint: 4,
                    },
                    EfficiencyPoint {
                        entity: "Beyonce".to_string(),
                        nominations: 4,
                        wins: 3,
                        efficiency_pct: 75.0,
                        size_hint: 12,
                    },
                ],
            },
            big4: Marquee {
                labels: vec!["Beyonce".to_string()],
                counts: vec![2],
            },
            meta: PayloadMeta {
                row_count: 4,
                column_names: vec!["year".to_string(), "category".to_string()],
                year_range: "1999-2000".to_string(),
                roles: RoleMapping {
                    temporal: Some("year".to_string()),
                    category: Some("category".to_string()),
                    ..Default::default()
                },
                degraded: vec![],
            },
        };

        Report { metadata, payload }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Grammy Charts Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Source:** data/grammys.csv"));
        assert!(markdown.contains("- **Years:** 1999-2000"));
        assert!(markdown.contains("| temporal | `year` |"));
        assert!(markdown.contains("| entity | _unresolved_ |"));
        assert!(markdown.contains("| Album Of The Year | 3 |"));
        assert!(markdown.contains("| Best Rock \\| Metal | 1 |"));
        assert!(markdown.contains("2 categories across 3 year buckets (1999 to Unknown)."));
        assert!(markdown.contains("| 2000 | 2 | 1 |"));
        assert!(markdown.contains("| Beyonce | 2 |"));
        assert!(!markdown.contains("## Degraded Sections"));
    }

    #[test]
    fn test_efficiency_table_sorted_by_wins() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        let beyonce = markdown.find("| Beyonce | 4 | 3 | 75.00% |").unwrap();
        let taylor = markdown.find("| Taylor Swift | 2 | 1 | 50.00% |").unwrap();
        assert!(beyonce < taylor);
    }

    #[test]
    fn test_empty_payload_sections() {
        let mut report = create_test_report();
        report.payload = Payload::default();
        report.payload.meta.degraded = vec!["evolution".to_string()];

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("No rows to chart."));
        assert!(markdown.contains("No year column was resolved"));
        assert!(markdown.contains("No entities to chart."));
        assert!(markdown.contains("No marquee category wins could be counted."));
        assert!(markdown.contains("- `evolution`"));
    }

    #[test]
    fn test_generate_json_payload() {
        let report = create_test_report();
        let json = generate_json_payload(&report).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["meta"]["rowCount"], 4);
        assert_eq!(parsed["polar"]["counts"][0], 3);
        assert_eq!(parsed["scatter"]["points"][1]["efficiencyPct"], 75.0);
        assert_eq!(parsed["evolution"]["datasets"][0]["borderColor"], "#ff6384");
        assert!(parsed.get("metadata").is_none());
        assert!(parsed["meta"].get("degraded").is_none());
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        write_output("{}", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
