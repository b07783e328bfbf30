//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `key -> JSON` lines for lists, pretty JSON for single items.
    #[default]
    Text,
    /// JSON document with sorted keys.
    Json,
    /// Human-readable table for lists.
    Table,
}

/// Print a keyed result (depots, drafts, components).
///
/// `row` turns an entry into a table row and is only used for
/// [`OutputFormat::Table`].
pub fn print_keyed<T, R, F>(items: &BTreeMap<String, T>, format: OutputFormat, row: F)
where
    T: Serialize,
    R: Tabled,
    F: Fn(&str, &T) -> R,
{
    match format {
        OutputFormat::Text => {
            let text = render_keyed(items);
            if !text.is_empty() {
                print!("{}", text);
            }
        }
        OutputFormat::Json => println!("{}", format_json(items, "{}")),
        OutputFormat::Table => {
            let rows: Vec<R> = items.iter().map(|(key, item)| row(key, item)).collect();
            print_table(&rows);
        }
    }
}

/// Print a single item in the specified format.
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text | OutputFormat::Table => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
        OutputFormat::Json => println!("{}", format_json(data, "{}")),
    }
}

fn print_table<R: Tabled>(rows: &[R]) {
    if rows.is_empty() {
        println!("{}", "No items found.".dimmed());
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Render `key -> JSON` lines, one entry per key in key order.
pub fn render_keyed<T: Serialize>(items: &BTreeMap<String, T>) -> String {
    let mut out = String::new();
    for (key, item) in items {
        let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
        out.push_str(&format!("{} -> {}\n", key, json));
    }
    out
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

#[derive(Debug, Serialize)]
pub struct ReceiptNextStep {
    pub label: &'static str,
    pub cmd: String,
}

/// Outcome of a write operation.
pub struct Receipt<'a> {
    pub message: String,
    pub status: &'a str,
    pub kind: &'a str,
    pub ids: serde_json::Value,
    pub next: &'a [ReceiptNextStep],
}

pub fn receipt_value(
    status: &str,
    kind: &str,
    ids: serde_json::Value,
    next: &[ReceiptNextStep],
) -> serde_json::Value {
    let mut receipt = serde_json::Map::new();
    receipt.insert("kind".to_string(), serde_json::json!(kind));
    receipt.insert("status".to_string(), serde_json::json!(status));
    receipt.insert("ids".to_string(), ids);
    receipt.insert(
        "next".to_string(),
        serde_json::to_value(next).unwrap_or_else(|_| serde_json::json!([])),
    );
    serde_json::json!({ "receipt": receipt })
}

pub fn print_receipt(format: OutputFormat, receipt: Receipt<'_>) {
    match format {
        OutputFormat::Text | OutputFormat::Table => {
            print_success(&receipt.message);
            for step in receipt.next {
                print_info(&format!("{}: {}", step.label, step.cmd));
            }
        }
        OutputFormat::Json => {
            let out = receipt_value(receipt.status, receipt.kind, receipt.ids, receipt.next);
            print_single(&out, OutputFormat::Json);
        }
    }
}

fn format_json<T: Serialize + ?Sized>(data: &T, fallback: &str) -> String {
    let value = serde_json::to_value(data).unwrap_or_else(|_| serde_json::json!({}));
    let sorted = sort_json_value(value);
    serde_json::to_string_pretty(&sorted).unwrap_or_else(|_| fallback.to_string())
}

fn sort_json_value(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Array(values) => {
            serde_json::Value::Array(values.into_iter().map(sort_json_value).collect())
        }
        serde_json::Value::Object(entries) => {
            let mut pairs: Vec<_> = entries.into_iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let mut mapped = serde_json::Map::new();
            for (key, value) in pairs {
                mapped.insert(key, sort_json_value(value));
            }
            serde_json::Value::Object(mapped)
        }
        other => other,
    }
}

/// Display helper for optional table cells.
pub fn display_option(opt: &Option<String>) -> String {
    opt.as_deref().unwrap_or("-").to_string()
}
