use anyhow::{Context, Result};
use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::battle::results::TOTAL_LABEL;
use crate::battle::{ExportRow, Standing};

/// Format points without a trailing ".0" ("4", "3.5", "12")
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        format!("{:.1}", points)
    }
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a label to fit available width, accounting for Unicode
fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn pad_left(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", " ".repeat(width.saturating_sub(len)), text)
}

/// Pivot of export rows: round labels down, contestants across.
struct Grid<'a> {
    labels: Vec<&'a str>,
    names: Vec<&'a str>,
    cells: Vec<Vec<Option<f64>>>,
}

impl<'a> Grid<'a> {
    fn from_rows(rows: &'a [ExportRow]) -> Self {
        let mut labels: Vec<&str> = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        for row in rows {
            if !labels.contains(&row.round_label.as_str()) {
                labels.push(&row.round_label);
            }
            if !names.contains(&row.contestant_name.as_str()) {
                names.push(&row.contestant_name);
            }
        }

        let mut cells = vec![vec![None; names.len()]; labels.len()];
        for row in rows {
            let r = labels.iter().position(|l| *l == row.round_label);
            let c = names.iter().position(|n| *n == row.contestant_name);
            if let (Some(r), Some(c)) = (r, c) {
                cells[r][c] = Some(row.total);
            }
        }

        Self { labels, names, cells }
    }
}

/// Format export rows as a table: one line per round instance, one column
/// per contestant, the TOTAL line last.
///
/// Round labels are truncated when the terminal is too narrow; piped output
/// is never truncated.
pub fn format_results_table(rows: &[ExportRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No rounds were judged.".to_string();
    }

    let grid = Grid::from_rows(rows);
    let separator = "  ";
    let column_widths: Vec<usize> = grid
        .names
        .iter()
        .map(|n| n.chars().count().max(5))
        .collect();
    let columns_total: usize = column_widths.iter().map(|w| w + separator.len()).sum();

    let natural_label_width = grid
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max("Ronda".len());
    let label_width = match get_terminal_width() {
        Some(width) if width > columns_total + 10 => natural_label_width.min(width - columns_total),
        // Very narrow terminal
        Some(_) => natural_label_width.min(10),
        None => natural_label_width,
    };

    let mut lines = Vec::with_capacity(grid.labels.len() + 1);

    let mut header = pad_right("Ronda", label_width);
    for (name, width) in grid.names.iter().zip(&column_widths) {
        header.push_str(separator);
        header.push_str(&pad_left(name, *width));
    }
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    for (label, cells) in grid.labels.iter().zip(&grid.cells) {
        let is_total = *label == TOTAL_LABEL;
        let label_cell = pad_right(&truncate_label(label, label_width), label_width);
        let mut line = if use_colors && !is_total {
            label_cell.cyan().to_string()
        } else {
            label_cell
        };
        for (cell, width) in cells.iter().zip(&column_widths) {
            line.push_str(separator);
            let text = cell.map(format_points).unwrap_or_else(|| "-".to_string());
            line.push_str(&pad_left(&text, *width));
        }
        lines.push(if use_colors && is_total {
            line.bold().to_string()
        } else {
            line
        });
    }

    lines.join("\n")
}

/// Format the ranking as numbered lines, highest total first.
pub fn format_ranking(standings: &[Standing], use_colors: bool) -> String {
    standings
        .iter()
        .enumerate()
        .map(|(idx, standing)| {
            let index_str = format!("{:>2}.", idx + 1);
            let points = pad_left(&format_points(standing.total), 6);
            if use_colors {
                format!(
                    "{} {}  {}",
                    index_str.dimmed(),
                    points.bold(),
                    standing.contestant.name.yellow()
                )
            } else {
                format!("{} {}  {}", index_str, points, standing.contestant.name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// "Winner: <name>" or a tie notice when nobody holds the top score alone.
pub fn format_winner_line(winner: Option<&str>, use_colors: bool) -> String {
    match winner {
        Some(name) if use_colors => format!("Winner: {}", name.green().bold()),
        Some(name) => format!("Winner: {}", name),
        None if use_colors => "Tie: no winner".yellow().to_string(),
        None => "Tie: no winner".to_string(),
    }
}

/// Format export rows as tab-separated values for scripting
/// Columns: round label, contestant, total (no headers, no colors)
pub fn format_tsv(rows: &[ExportRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}",
                row.round_label,
                row.contestant_name,
                format_points(row.total)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format export rows as CSV. The `Ronda,MC,Total` header comes from the
/// serde names on [`ExportRow`].
pub fn format_csv(rows: &[ExportRow]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if rows.is_empty() {
        wtr.write_record(["Ronda", "MC", "Total"])
            .context("Failed to write CSV header")?;
    }
    for row in rows {
        wtr.serialize(row).context("Failed to write CSV row")?;
    }
    let bytes = wtr.into_inner().context("Failed to flush CSV output")?;
    let text = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
    Ok(text.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::Contestant;

    fn row(label: &str, name: &str, total: f64) -> ExportRow {
        ExportRow {
            round_label: label.to_string(),
            contestant_name: name.to_string(),
            total,
        }
    }

    fn sample_rows() -> Vec<ExportRow> {
        vec![
            row("4x4", "Chuty", 6.5),
            row("4x4", "Aczino", 7.0),
            row("Acapella (Ida)", "Chuty", 10.0),
            row("Acapella (Ida)", "Aczino", 9.5),
            row(TOTAL_LABEL, "Chuty", 16.5),
            row(TOTAL_LABEL, "Aczino", 16.5),
        ]
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(0.0), "0");
        assert_eq!(format_points(4.0), "4");
        assert_eq!(format_points(3.5), "3.5");
        assert_eq!(format_points(16.5), "16.5");
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("4x4", 10), "4x4");
        assert_eq!(truncate_label("Minuto Libre (Vuelta)", 12), "Minuto Li...");
        assert_eq!(truncate_label("Temática", 3), "Tem");
    }

    #[test]
    fn test_format_results_table_empty() {
        assert_eq!(format_results_table(&[], false), "No rounds were judged.");
    }

    #[test]
    fn test_format_results_table_pivots_rows() {
        let result = format_results_table(&sample_rows(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Ronda"));
        assert!(lines[0].contains("Chuty"));
        assert!(lines[0].contains("Aczino"));
        assert!(lines[1].contains("6.5"));
        assert!(lines[1].trim_end().ends_with('7'));
        assert!(lines[2].contains("Acapella"));
        assert!(lines[3].starts_with(TOTAL_LABEL));
        assert!(lines[3].contains("16.5"));
    }

    #[test]
    fn test_format_ranking_and_winner() {
        let a = Contestant { id: "mc-0".into(), name: "Chuty".into() };
        let b = Contestant { id: "mc-1".into(), name: "Aczino".into() };
        let standings = vec![
            Standing { contestant: &b, total: 17.0 },
            Standing { contestant: &a, total: 16.5 },
        ];
        let result = format_ranking(&standings, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], " 1.     17  Aczino");
        assert_eq!(lines[1], " 2.   16.5  Chuty");

        assert_eq!(format_winner_line(Some("Aczino"), false), "Winner: Aczino");
        assert_eq!(format_winner_line(None, false), "Tie: no winner");
    }

    #[test]
    fn test_format_tsv() {
        assert_eq!(format_tsv(&[]), "");
        let result = format_tsv(&sample_rows());
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "4x4\tChuty\t6.5");
        assert_eq!(lines[5], "TOTAL\tAczino\t16.5");
    }

    #[test]
    fn test_format_csv_quotes_fields() {
        let rows = vec![row("Temática", "El \"Rey\", MC", 3.5)];
        let result = format_csv(&rows).unwrap();
        assert_eq!(result, "Ronda,MC,Total\nTemática,\"El \"\"Rey\"\", MC\",3.5");
    }

    #[test]
    fn test_format_csv_rows_and_empty_header() {
        assert_eq!(format_csv(&[]).unwrap(), "Ronda,MC,Total");

        let result = format_csv(&sample_rows()).unwrap();
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "Ronda,MC,Total");
        assert_eq!(lines[3], "Acapella (Ida),Chuty,10.0");
        assert_eq!(lines[6], "TOTAL,Aczino,16.5");
    }
}
