//! Plain-text table rendering for `infer` and `show` output.

use std::fmt::Write as _;

use itertools::Itertools;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| cell_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = flatten(value);
            let pad = width.saturating_sub(cell_width(&cell));
            format!("{cell}{}", " ".repeat(pad))
        })
        .join("  ")
        .trim_end()
        .to_string()
}

fn flatten(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}
