//! Output formatting helpers for human-readable and JSON output.

use std::fmt::Display;

use serde::Serialize;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a list of keys, one per line, or as a JSON array.
///
/// `empty` is printed instead of nothing when there are no human-readable items.
pub fn print_keys<T>(
    items: &[T],
    empty: Option<&str>,
    format: OutputFormat,
) -> Result<(), serde_json::Error>
where
    T: Display + Serialize,
{
    match format {
        OutputFormat::Human => {
            if items.is_empty() {
                if let Some(message) = empty {
                    println!("{message}");
                }
            }
            for item in items {
                println!("{item}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(items)?),
    }
    Ok(())
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length. Values are
/// rendered on one line, so a nested value never breaks the alignment.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    println!("{}", format_row(headers, &widths));
    for row in rows {
        let cells: Vec<&str> = row.iter().take(col_count).map(String::as_str).collect();
        println!("{}", format_row(&cells, &widths));
    }
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    line.join("  ").trim_end().to_string()
}
