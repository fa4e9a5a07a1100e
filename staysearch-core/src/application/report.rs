//! Deterministic terminal rendering of search results.

use crate::constants::RULE_WIDTH;
use crate::domain::{ListingRecord, SearchResultSet};
use crate::rpc::ToolDescriptor;
use std::fmt::Write;

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

/// Renders the first `limit` listings as plain-text blocks, each closed by
/// a `-` rule, followed by a one-line summary.
pub fn render_direct(results: &SearchResultSet, limit: usize) -> String {
    let shown = results.top(limit);
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('='));

    if results.is_empty() {
        let _ = writeln!(out, "No listings found.");
    } else if shown.is_empty() {
        let _ = writeln!(out, "No listings shown.");
    }
    for (index, record) in shown.iter().enumerate() {
        let _ = writeln!(out, "LISTING #{}: {}", index + 1, record.title);
        let _ = writeln!(out, "PRICE: {}", record.price());
        let _ = writeln!(out, "RATING: {}", record.rating());
        let _ = writeln!(out, "URL: {}", record.url);
        let _ = writeln!(out, "{}", rule('-'));
    }

    let _ = writeln!(out, "{}", rule('='));
    let _ = writeln!(out, "SUMMARY: {}", summarize(shown, results.len()));
    let _ = writeln!(out, "{}", rule('='));
    out
}

fn summarize(shown: &[ListingRecord], total: usize) -> String {
    let mut line = format!("Showing {} of {} listings", shown.len(), total);

    let mut priced: Vec<(f64, &str)> = shown
        .iter()
        .filter_map(|record| {
            let label = record.price.as_deref()?;
            price_amount(label).map(|amount| (amount, label))
        })
        .collect();
    priced.sort_by(|a, b| a.0.total_cmp(&b.0));
    match (priced.first(), priced.last()) {
        (Some(low), Some(high)) if priced.len() > 1 => {
            let _ = write!(line, "; prices range from {} to {}", low.1, high.1);
        }
        (Some(only), _) => {
            let _ = write!(line, "; price {}", only.1);
        }
        _ => {}
    }

    let rated = shown.iter().filter(|record| record.is_rated()).count();
    let _ = write!(line, "; {rated} rated");
    line
}

/// First number in a price label such as "$1,234 total" or "€ 99.50".
fn price_amount(label: &str) -> Option<f64> {
    let start = label.find(|c: char| c.is_ascii_digit())?;
    let digits: String = label[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

/// Renders the tools a provider advertised, one per line.
pub fn render_tool_list(tools: &[ToolDescriptor]) -> String {
    let mut out = String::from("Available tools:\n");
    if tools.is_empty() {
        out.push_str("(none)\n");
    }
    for tool in tools {
        let description = tool.description.as_deref().unwrap_or("no description");
        let _ = writeln!(out, "- {}: {}", tool.name, description);
    }
    out
}
