pub mod formatter;

pub use formatter::{
    format_csv, format_points, format_ranking, format_results_table, format_tsv,
    format_winner_line, should_use_colors,
};
