// Plain-text rendering for the command line

use crate::types::{AppError, Match};

pub const NO_RESULTS_MESSAGE: &str = "No results found for your query.";

/// Single human-readable line for any pipeline failure
pub fn error_message(error: &AppError) -> String {
    format!("An error occurred: {}", error)
}

/// Aligned `#  Code  Title` table, one row per match in rank order
pub fn render_table(matches: &[Match]) -> String {
    let headers = ["#", "Code", "Title"];
    let rows: Vec<[String; 3]> = matches
        .iter()
        .map(|m| [m.rank.to_string(), m.code.clone(), m.title.clone()])
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 3]| -> String {
        let line = format!(
            "{:>w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
        );
        line.trim_end().to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(format_row(headers));
    let rules = widths.map(|w| "-".repeat(w));
    out.push(format_row([rules[0].as_str(), rules[1].as_str(), rules[2].as_str()]));
    for row in &rows {
        out.push(format_row([row[0].as_str(), row[1].as_str(), row[2].as_str()]));
    }
    out.join("\n")
}
