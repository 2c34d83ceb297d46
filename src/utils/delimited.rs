//! Lenient comma-separated text reader used for vacancy imports and published sheets.
//!
//! A `"` toggles quoted mode and is dropped; doubled quotes are not treated as an
//! escaped quote, and a quoted field cannot span lines. Text written by the
//! export formatter therefore does not always read back verbatim.

use std::collections::HashMap;

pub type Row = HashMap<String, String>;

/// Parses `text` into one map per non-empty data line, keyed by the header row.
pub fn parse(text: &str) -> Vec<Row> {
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line
        .split(',')
        .map(|h| h.trim().to_string())
        .collect();

    lines
        .map(|line| {
            let cols = split_fields(line);
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = cols.get(idx).map(|c| c.trim()).unwrap_or_default();
                    (header.clone(), value.to_string())
                })
                .collect()
        })
        .collect()
}

fn split_fields(line: &str) -> Vec<String> {
    let mut cols = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cols.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    cols.push(current);
    cols
}
