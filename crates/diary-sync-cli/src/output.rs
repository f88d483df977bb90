use clap::ValueEnum;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Color, Table};
use diary_sync_core::{BatchStatus, SyncReport};
use diary_sync_models::{MovieRecord, SyncCounts};
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

/// User-facing messages, kept apart from the tracing log on stderr
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message("success", msg.as_ref(), |m| println!("{} {}", "✓".green(), m));
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message("info", msg.as_ref(), |m| println!("{}", m));
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message("warning", msg.as_ref(), |m| println!("{} {}", "⚠".yellow(), m));
    }

    /// Shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        match self.format {
            OutputFormat::Human => eprintln!("{} {}", "✗".red(), msg.as_ref()),
            _ => self.print_json(&json!({ "type": "error", "message": msg.as_ref() })),
        }
    }

    fn message(&self, kind: &str, msg: &str, human: impl FnOnce(&str)) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => human(msg),
            _ => self.print_json(&json!({ "type": kind, "message": msg })),
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }
        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(data).unwrap_or_default()),
            _ => println!("{}", serde_json::to_string(data).unwrap_or_default()),
        }
    }

    /// Records as a table (human) or a JSON array
    pub fn records(&self, records: &[MovieRecord]) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => println!("{}", movie_table(records)),
            _ => self.print_json(&json!({ "type": "records", "records": records })),
        }
    }

    /// Final summary of a sync run
    pub fn report(&self, report: &SyncReport) {
        match self.format {
            OutputFormat::Human => {
                if self.quiet {
                    return;
                }
                println!(
                    "Retrieved {} feed entries, {} movies in window ({:.1}s)",
                    report.fetched,
                    report.records.len(),
                    report.duration.as_secs_f64()
                );
                self.batch_line("History", &report.history);
                self.batch_line("Ratings", &report.ratings);
            }
            _ => self.json(&json!({
                "type": "report",
                "success": report.is_success(),
                "fetched": report.fetched,
                "records": report.records.len(),
                "history": report.history,
                "ratings": report.ratings,
                "duration_seconds": report.duration.as_secs_f64(),
            })),
        }
    }

    fn batch_line(&self, label: &str, status: &BatchStatus) {
        match status {
            BatchStatus::Disabled => println!("{} {}: disabled", "-".bright_black(), label),
            BatchStatus::Skipped => println!("{} {}: nothing to sync", "-".bright_black(), label),
            BatchStatus::DryRun(n) => println!("{} {}: would sync {} movies", "•".cyan(), label, n),
            BatchStatus::Synced(counts) => self.success(format!("{} synced: {}", label, counts_summary(counts))),
            BatchStatus::Failed(e) => self.error(format!("{} failed: {}", label, e)),
        }
    }
}

fn counts_summary(counts: &SyncCounts) -> String {
    let mut parts = vec![match counts.added {
        Some(added) => format!("{} added", added),
        None => "added count unknown".to_string(),
    }];
    if let Some(updated) = counts.updated.filter(|n| *n > 0) {
        parts.push(format!("{} updated", updated));
    }
    if let Some(existing) = counts.existing {
        parts.push(format!("{} already on Trakt", existing));
    }
    if let Some(not_found) = counts.not_found.filter(|n| *n > 0) {
        parts.push(format!("{} not found", not_found));
    }
    parts.join(", ")
}

pub fn movie_table(records: &[MovieRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Year").add_attribute(Attribute::Bold),
        Cell::new("Watched").add_attribute(Attribute::Bold),
        Cell::new("Rating").add_attribute(Attribute::Bold),
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(&record.title).fg(Color::Cyan),
            Cell::new(record.year.map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string())),
            Cell::new(record.watched_on().to_string()),
            Cell::new(record.rating.map(|r| format!("{}/10", r)).unwrap_or_default()),
        ]);
    }
    table
}
