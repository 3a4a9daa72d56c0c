/// Output formatting: terminal table, JSON, share text and CSV.
use rankulator_core::{group_by_tier, Pool, RankedResult};
use serde::Serialize;

#[derive(Serialize)]
struct JsonTier<'a> {
    tier: usize,
    label: &'a str,
    items: &'a [RankedResult],
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    title: &'a str,
    total_batches: usize,
    seed: u64,
    tiers: Vec<JsonTier<'a>>,
}

fn team<'a>(pool: &'a Pool, id: &str) -> Option<&'a str> {
    pool.get(id)
        .and_then(|item| item.metadata.get("team"))
        .map(String::as_str)
}

/// Results as a terminal table grouped by tier.
pub fn table_content(results: &[RankedResult], pool: &Pool, total_batches: usize) -> String {
    let name_width = results
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4); // at least "Item"

    let mut text = String::new();
    for group in group_by_tier(results) {
        text.push_str(&format!("\n{} ({} items)\n", group.label, group.results.len()));
        text.push_str(&format!("  # | {:<name_width$} | Score | Z-Score\n", "Item"));
        text.push_str(&format!("----|-{}-|-------|--------\n", "-".repeat(name_width)));
        for r in group.results {
            text.push_str(&format!(
                "{:>3} | {:<name_width$} | {:>5} | {:>7.2}\n",
                r.rank, r.name, r.score, r.z_score,
            ));
        }
    }

    text.push_str(&format!(
        "\n{} items ranked across {} batches ({} with a team listed)\n",
        results.len(),
        total_batches,
        results.iter().filter(|r| team(pool, &r.id).is_some()).count(),
    ));
    text
}

/// Results as a pretty-printed JSON document.
pub fn json_content(
    results: &[RankedResult],
    title: &str,
    total_batches: usize,
    seed: u64,
) -> serde_json::Result<String> {
    let tiers = group_by_tier(results)
        .into_iter()
        .map(|group| JsonTier {
            tier: group.tier,
            label: group.label,
            items: group.results,
        })
        .collect();

    let output = JsonOutput {
        title,
        total_batches,
        seed,
        tiers,
    };
    serde_json::to_string_pretty(&output)
}

/// Which renderings a finished session asked for.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub json: bool,
    pub share: bool,
    pub title: String,
    pub seed: u64,
}

/// Rendered output split by destination stream.
#[derive(Debug, Default)]
pub struct Report {
    pub stdout: String,
    pub stderr: String,
}

/// Render the final results. With `json` set, stdout carries only the JSON
/// document and the share text moves to stderr.
pub fn render_report(
    results: &[RankedResult],
    pool: &Pool,
    total_batches: usize,
    options: &ReportOptions,
) -> serde_json::Result<Report> {
    let mut report = Report::default();
    if options.json {
        report.stdout = json_content(results, &options.title, total_batches, options.seed)?;
        report.stdout.push('\n');
    } else {
        report.stdout = table_content(results, pool, total_batches);
    }

    if options.share {
        let share = share_text(results, pool, &options.title, total_batches);
        let target = if options.json { &mut report.stderr } else { &mut report.stdout };
        target.push_str(&format!("\n{share}\n"));
    }
    Ok(report)
}

/// Plain-text summary suitable for pasting into a chat.
pub fn share_text(results: &[RankedResult], pool: &Pool, title: &str, total_batches: usize) -> String {
    let mut text = format!("My {title} Rankings from Rankulator\n\n");

    for group in group_by_tier(results) {
        text.push_str(&format!("{} ({} items):\n", group.label, group.results.len()));
        for (i, r) in group.results.iter().enumerate() {
            let team = team(pool, &r.id)
                .map(|t| format!(" ({t})"))
                .unwrap_or_default();
            text.push_str(&format!("{}. {}{} - Score: {}\n", i + 1, r.name, team, r.score));
        }
        text.push('\n');
    }

    text.push_str(&format!("Created with Rankulator after {total_batches} ranking batches"));
    text
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn csv_content(results: &[RankedResult], pool: &Pool) -> String {
    let mut csv = String::from("Rank,Name,Team,Tier,Tier Label,Score,Z-Score,College,Years Experience,Age\n");
    for r in results {
        let meta = |key: &str| {
            pool.get(&r.id)
                .and_then(|item| item.metadata.get(key))
                .map(|v| csv_field(v))
                .unwrap_or_else(|| "N/A".to_string())
        };
        let row = [
            r.rank.to_string(),
            csv_field(&r.name),
            csv_field(team(pool, &r.id).unwrap_or("N/A")),
            r.tier.to_string(),
            csv_field(&r.tier_label),
            r.score.to_string(),
            format!("{:.4}", r.z_score),
            meta("college"),
            meta("years_exp"),
            meta("age"),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}
