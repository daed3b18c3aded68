// src/report/render.rs
// =============================================================================
// Prints a finished CrawlReport.
//
// Three formats:
// - table: human-readable, one row per broken link (all rows in verbose mode)
// - JSON: the whole report, for tools that post-process results
// - CI annotations: "::error ::Kind: detail - url" lines that CI runners
//   turn into inline error markers
//
// Plus the completion timestamp written as an output field when the CI
// runner provides a GITHUB_OUTPUT file.
//
// Everything writes into a generic `impl Write` so tests can render into a
// Vec<u8> instead of stdout.
// =============================================================================

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::checker::FetchOutcome;
use crate::report::{CrawlReport, Verdict};

const URL_WIDTH: usize = 60;

/// Prints the report to stdout, as JSON or as a table plus annotations.
pub fn print_report(report: &CrawlReport, json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        write_json(&mut out, report)
    } else {
        write_table(&mut out, report)?;
        write_annotations(&mut out, report)
    }
}

pub fn write_json(out: &mut impl Write, report: &CrawlReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

// Prints results as a human-readable table in the terminal
pub fn write_table(out: &mut impl Write, report: &CrawlReport) -> io::Result<()> {
    let mut rows: Vec<&FetchOutcome> = report.broken.iter().chain(&report.healthy).collect();
    rows.sort_by(|a, b| a.url.as_str().cmp(b.url.as_str()));

    if !rows.is_empty() {
        writeln!(out, "{:<60} {:<22} {:<8} {}", "URL", "STATUS", "TRIES", "FOUND ON")?;
        writeln!(out, "{}", "=".repeat(110))?;
        for outcome in rows {
            writeln!(
                out,
                "{:<60} {:<22} {:<8} {}",
                truncate(outcome.url.as_str()),
                format_status(outcome),
                outcome.attempts,
                outcome.origin.as_ref().map_or("-", |u| u.as_str())
            )?;
        }
        writeln!(out)?;
    }

    let stats = &report.stats;
    writeln!(out, "📊 Summary:")?;
    writeln!(out, "   ✅ OK: {}", stats.healthy)?;
    writeln!(out, "   ❌ Broken: {}", stats.broken)?;
    writeln!(out, "   📋 Total: {}", report.total_checked)?;
    if !stats.by_status.is_empty() {
        let by_status: Vec<String> = stats
            .by_status
            .iter()
            .map(|(status, count)| format!("{}×{}", status, count))
            .collect();
        writeln!(out, "   🔢 Status codes: {}", by_status.join(", "))?;
    }
    if !stats.by_error.is_empty() {
        let by_error: Vec<String> = stats
            .by_error
            .iter()
            .map(|(kind, count)| format!("{}×{}", kind, count))
            .collect();
        writeln!(out, "   ⚠️  Errors: {}", by_error.join(", "))?;
    }
    writeln!(
        out,
        "   ⏱️  Elapsed: {:.2}s ({} requests)",
        report.elapsed().num_milliseconds() as f64 / 1000.0,
        stats.attempts
    )?;
    if !report.complete {
        writeln!(
            out,
            "   ⛔ Crawl stopped early, {} URL(s) left unchecked",
            report.unchecked
        )?;
    }

    match report.verdict() {
        Verdict::Success => writeln!(out, "✅ No broken links found"),
        Verdict::Failure => writeln!(out, "❌ Found {} broken link(s)", report.broken.len()),
    }
}

/// One `::error ::` line per broken link.
pub fn write_annotations(out: &mut impl Write, report: &CrawlReport) -> io::Result<()> {
    for outcome in &report.broken {
        let detail = match (outcome.error, outcome.status) {
            (Some(kind), _) => format!(
                "{}: {}",
                kind,
                outcome.message.as_deref().unwrap_or("request failed")
            ),
            (None, Some(status)) => format!("HttpError: {}", status),
            (None, None) => "UnknownError".to_string(),
        };
        writeln!(out, "::error ::{} - {}", detail, outcome.url)?;
    }
    Ok(())
}

/// Appends `time=<finished_at>` to the CI output file.
pub fn write_output_time(path: &Path, report: &CrawlReport) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "time={}", report.finished_at.to_rfc3339())
}

// Formats the outcome as a short status cell
fn format_status(outcome: &FetchOutcome) -> String {
    if outcome.is_broken() {
        format!("❌ {}", outcome.label())
    } else if outcome.final_url.is_some() {
        format!("🔀 {}", outcome.label())
    } else {
        format!("✅ {}", outcome.label())
    }
}

// Truncate URL if too long for display
fn truncate(url: &str) -> String {
    if url.chars().count() > URL_WIDTH - 3 {
        let cut: String = url.chars().take(URL_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        url.to_string()
    }
}
