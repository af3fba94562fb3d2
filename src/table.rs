use std::fmt::Write as _;

use crate::model::RankedUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

const PREVIEW_COLUMNS: [(&str, Align); 5] = [
    ("month", Align::Right),
    ("rank", Align::Right),
    ("article_code", Align::Left),
    ("article_group", Align::Left),
    ("count", Align::Right),
];

/// Renders up to `limit` ranked rows as an aligned plain-text table.
pub fn render_ranked(ranked: &[RankedUsage], limit: usize) -> String {
    let rows = ranked
        .iter()
        .take(limit)
        .map(|row| {
            [
                row.month.to_string(),
                row.rank.to_string(),
                sanitize(&row.article_code),
                row.article_group.as_deref().map(sanitize).unwrap_or_default(),
                row.count.to_string(),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = PREVIEW_COLUMNS.map(|(name, _)| name.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header = PREVIEW_COLUMNS.map(|(name, _)| name.to_string());
    let _ = writeln!(output, "{}", format_line(&header, &widths));
    let rule = widths.map(|w| "-".repeat(w));
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    if ranked.len() > limit {
        let _ = writeln!(output, "... {} more row(s)", ranked.len() - limit);
    }
    output
}

fn format_line(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let padding = widths[idx].saturating_sub(cell.chars().count());
        match PREVIEW_COLUMNS[idx].1 {
            Align::Left => {
                line.push_str(cell);
                line.push_str(&" ".repeat(padding));
            }
            Align::Right => {
                line.push_str(&" ".repeat(padding));
                line.push_str(cell);
            }
        }
    }
    line.trim_end().to_string()
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}
