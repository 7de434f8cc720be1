use serde::Serialize;

use super::model::Contestant;
use super::session::BattleSession;

/// Label of the trailing per-contestant rows in [`export_rows`].
pub const TOTAL_LABEL: &str = "TOTAL";

#[derive(Debug, Clone, PartialEq)]
pub struct Standing<'a> {
    pub contestant: &'a Contestant,
    pub total: f64,
}

/// One row of the tabular battle report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Ronda")]
    pub round_label: String,
    #[serde(rename = "MC")]
    pub contestant_name: String,
    #[serde(rename = "Total")]
    pub total: f64,
}

/// Contestants ordered by grand total, highest first.
/// Equal totals keep the order contestants were added in.
pub fn ranking(session: &BattleSession) -> Vec<Standing<'_>> {
    let mut standings: Vec<Standing> = session
        .contestants()
        .iter()
        .map(|c| Standing {
            contestant: c,
            total: session.grand_total(&c.id),
        })
        .collect();

    // sort_by is stable, so ties stay in setup order
    standings.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    standings
}

/// The contestant with the highest grand total, or `None` when the top score
/// is shared (a tie) or there is nobody to rank.
pub fn winner(session: &BattleSession) -> Option<&Contestant> {
    let standings = ranking(session);
    let mut iter = standings.iter();
    let first = iter.next()?;
    match iter.next() {
        Some(second) if second.total == first.total => None,
        _ => Some(first.contestant),
    }
}

/// One row per (round instance, contestant) in play order, then one
/// `TOTAL` row per contestant with the grand total.
pub fn export_rows(session: &BattleSession) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for key in session.round_keys() {
        let label = session.round_label(key);
        for contestant in session.contestants() {
            rows.push(ExportRow {
                round_label: label.clone(),
                contestant_name: contestant.name.clone(),
                total: session.round_subtotal(key, &contestant.id),
            });
        }
    }
    for contestant in session.contestants() {
        rows.push(ExportRow {
            round_label: TOTAL_LABEL.to_string(),
            contestant_name: contestant.name.clone(),
            total: session.grand_total(&contestant.id),
        });
    }
    rows
}
