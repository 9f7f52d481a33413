//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use mendan_core::calendar::WEEKDAY_HEADERS;
use mendan_core::search::{preview, SearchHit};
use mendan_core::{DayRecord, Entry, EntryField, MonthGrid};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print one date with every entry in full
    pub fn print_day(&self, day: &DayRecord) {
        match self.format {
            OutputFormat::Human => {
                println!("面談日: {}", day.date);
                for (index, entry) in day.records.iter().enumerate() {
                    println!();
                    println!("── 記録 {} ({}) ──", index + 1, short_id(&entry.id));
                    print_entry_fields(entry);
                }
                println!();
                println!("{} record(s)", day.records.len());
            }
            OutputFormat::Json => print_json(day),
            OutputFormat::Quiet => {
                for entry in &day.records {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print a list of dates with their entry names
    pub fn print_days(&self, days: &[DayRecord]) {
        match self.format {
            OutputFormat::Human => {
                if days.is_empty() {
                    println!("No records found.");
                    return;
                }
                for day in days {
                    println!(
                        "{} | {:>2} | {}",
                        day.date,
                        day.records.len(),
                        truncate(&day.summary(), 60)
                    );
                }
                let entries: usize = days.iter().map(|d| d.records.len()).sum();
                println!("\n{} date(s), {} record(s)", days.len(), entries);
            }
            OutputFormat::Json => print_json(&days),
            OutputFormat::Quiet => {
                for day in days {
                    println!("{}", day.date);
                }
            }
        }
    }

    /// Print search results
    pub fn print_hits(&self, hits: &[SearchHit]) {
        match self.format {
            OutputFormat::Human => {
                if hits.is_empty() {
                    println!("No matching records.");
                    return;
                }
                for hit in hits {
                    println!(
                        "{} | {} | {} | {}",
                        hit.date,
                        short_id(&hit.entry.id),
                        truncate(&hit.entry.student_name, 20),
                        hit.entry.category
                    );
                    println!(
                        "    {}",
                        preview(&hit.entry.content, 100).replace('\n', " ")
                    );
                }
                println!("\n{} match(es)", hits.len());
            }
            OutputFormat::Json => {
                let json: Vec<_> = hits
                    .iter()
                    .map(|h| serde_json::json!({"date": h.date, "record": h.entry}))
                    .collect();
                print_json(&json);
            }
            OutputFormat::Quiet => {
                for hit in hits {
                    println!("{} {}", hit.date, hit.entry.id);
                }
            }
        }
    }

    /// Print a month grid
    pub fn print_month(&self, grid: &MonthGrid) {
        match self.format {
            OutputFormat::Human => {
                println!("{}", grid.cursor.label());
                let header: Vec<String> = WEEKDAY_HEADERS.iter().map(|d| format!(" {} ", d)).collect();
                println!("{}", header.join(""));

                for week in grid.weeks() {
                    let line: String = week
                        .iter()
                        .map(|cell| {
                            let marker = if cell.is_today {
                                '*'
                            } else if cell.entry_count > 0 {
                                '+'
                            } else {
                                ' '
                            };
                            if cell.in_current_month {
                                format!("{:>3}{}", cell.day, marker)
                            } else {
                                "  . ".to_string()
                            }
                        })
                        .collect();
                    println!("{}", line.trim_end());
                }

                let busy: Vec<_> = grid.cells.iter().filter(|c| c.summary.is_some()).collect();
                if !busy.is_empty() {
                    println!();
                    for cell in busy {
                        println!(
                            "{} ({}) {}",
                            cell.key,
                            cell.entry_count,
                            cell.summary.as_deref().unwrap_or_default()
                        );
                    }
                }
            }
            OutputFormat::Json => {
                let cells: Vec<_> = grid
                    .cells
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "date": c.key,
                            "day": c.day,
                            "in_current_month": c.in_current_month,
                            "is_today": c.is_today,
                            "summary": c.summary,
                            "entry_count": c.entry_count,
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "year": grid.cursor.year(),
                    "month": grid.cursor.month(),
                    "cells": cells,
                }));
            }
            OutputFormat::Quiet => {
                for cell in grid.cells.iter().filter(|c| c.entry_count > 0) {
                    println!("{}", cell.key);
                }
            }
        }
    }

    /// Print the template slots
    pub fn print_templates(&self, templates: &[String]) {
        match self.format {
            OutputFormat::Human => {
                for (index, text) in templates.iter().enumerate() {
                    let shown = if text.is_empty() {
                        "(empty)".to_string()
                    } else {
                        truncate_line(text, 60)
                    };
                    println!("[{}] {}", index + 1, shown);
                }
            }
            OutputFormat::Json => print_json(&templates),
            OutputFormat::Quiet => {
                for (index, text) in templates.iter().enumerate() {
                    if !text.is_empty() {
                        println!("{}", index + 1);
                    }
                }
            }
        }
    }

    /// Print the full text of one template
    pub fn print_template(&self, slot: usize, text: &str) {
        match self.format {
            OutputFormat::Human | OutputFormat::Quiet => println!("{}", text),
            OutputFormat::Json => print_json(&serde_json::json!({"slot": slot, "content": text})),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_entry_fields(entry: &Entry) {
    for field in EntryField::ALL {
        if field == EntryField::Content {
            println!("{}:", field.label());
            for line in entry.content.lines() {
                println!("  {}", line);
            }
        } else {
            println!("{}: {}", field.label(), entry.field(field));
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to encode JSON output: {}", e),
    }
}

/// First eight characters of an id
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
