// Plain-text ranking report for the scored table.

use std::collections::HashMap;

use crate::model::{StatRow, StatTable};

/// Format the top `n` rows by swish score as an aligned text table.
///
/// Display names come from the player directory; a player missing from the
/// directory falls back to their id. Rows the scorer never reached (no
/// swish score) sort last.
pub fn format_top_n(table: &StatTable, directory: &HashMap<i64, String>, n: usize) -> String {
    let mut rows: Vec<&StatRow> = table.rows().iter().collect();
    rows.sort_by(|a, b| {
        let sa = a.swish_score.unwrap_or(f64::NEG_INFINITY);
        let sb = b.swish_score.unwrap_or(f64::NEG_INFINITY);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.truncate(n);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<4} {:<8} {:<26} {:<5} {:>8} {:>6} {:>6} {:>6}\n",
        "Rank", "Season", "Player", "Team", "Swish", "PTS", "REB", "AST"
    ));

    for row in rows {
        let name = directory
            .get(&row.player_id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", row.player_id));
        let rank = row
            .overall_rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<4} {:<8} {:<26} {:<5} {:>8.2} {:>6.1} {:>6.1} {:>6.1}\n",
            rank,
            row.season.to_string(),
            name,
            row.team.as_deref().unwrap_or("-"),
            row.swish_score.unwrap_or(0.0),
            row.points,
            row.rebounds,
            row.assists,
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
