// Composite swish score and season-cohort ranking.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::features::PipelineError;
use crate::model::{SeasonToken, StatKey, StatTable};

const STAGE: &str = "composite scorer";

/// Tie handling for `overall_rank`. Only "min" (competition) ranking is
/// recognized: rows tied for the best score all receive rank 1 and the
/// next distinct score receives rank 3, not 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankMethod {
    #[default]
    Min,
}

/// Combines weighted per-stat z-scores into `swish_score` and assigns
/// `overall_rank` within each season cohort.
///
/// Weights are signed: positive for "higher is better" stats, negative for
/// turnovers. Configured stats whose z-score column is absent from the
/// table are skipped with a warning rather than failing the run. Output
/// preserves the input row count, and ranks are season-scoped — never
/// comparable across seasons.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: BTreeMap<StatKey, f64>,
    rank_method: RankMethod,
}

impl CompositeScorer {
    pub fn new(weights: BTreeMap<StatKey, f64>, rank_method: RankMethod) -> Self {
        Self {
            weights,
            rank_method,
        }
    }

    pub fn apply(&self, mut table: StatTable) -> Result<StatTable, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::EmptyInput { stage: STAGE });
        }

        // A configured stat participates only if its z-score column was
        // actually produced for this table.
        let active: Vec<(StatKey, f64)> = self
            .weights
            .iter()
            .map(|(stat, weight)| (*stat, *weight))
            .filter(|(stat, _)| {
                let present = stat.supports_z_score()
                    && table.rows().iter().any(|r| stat.z_score(r).is_some());
                if !present {
                    warn!(stat = stat.name(), "z-score column absent; skipping weight");
                }
                present
            })
            .collect();

        for row in table.rows_mut() {
            let score: f64 = active
                .iter()
                .map(|(stat, weight)| stat.z_score(row).unwrap_or(0.0) * weight)
                .sum();
            row.swish_score = Some(score);
        }

        match self.rank_method {
            RankMethod::Min => assign_min_ranks(&mut table),
        }

        info!(rows = table.len(), stats = active.len(), "swish scores and ranks assigned");
        Ok(table)
    }
}

/// Competition ("min") ranking by descending swish score within each
/// season cohort: tied scores share the smallest rank of the group.
fn assign_min_ranks(table: &mut StatTable) {
    let mut by_season: HashMap<SeasonToken, Vec<(usize, f64)>> = HashMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        let score = row.swish_score.unwrap_or(0.0);
        by_season.entry(row.season).or_default().push((i, score));
    }

    let mut ranks: Vec<u32> = vec![0; table.len()];
    for cohort in by_season.values_mut() {
        cohort.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let mut rank = 1u32;
        for (pos, &(row_idx, score)) in cohort.iter().enumerate() {
            if pos > 0 && score < cohort[pos - 1].1 {
                rank = pos as u32 + 1;
            }
            ranks[row_idx] = rank;
        }
    }

    for (row, rank) in table.rows_mut().iter_mut().zip(ranks) {
        row.overall_rank = Some(rank);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SeasonToken, StatRow};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn scored_row(player_id: i64, start_year: u16, points_z: f64, turnovers_z: f64) -> StatRow {
        let mut r = StatRow::new(player_id, SeasonToken::from_start_year(start_year));
        r.points_z_score = Some(points_z);
        r.turnovers_z_score = Some(turnovers_z);
        r
    }

    fn weights() -> BTreeMap<StatKey, f64> {
        let mut w = BTreeMap::new();
        w.insert(StatKey::Points, 1.195);
        w.insert(StatKey::Turnovers, -1.217);
        w
    }

    fn find(table: &StatTable, player_id: i64) -> &StatRow {
        table.rows().iter().find(|r| r.player_id == player_id).unwrap()
    }

    #[test]
    fn swish_score_is_weighted_sum() {
        let table = StatTable::new(vec![scored_row(1, 2021, 2.0, 1.0)]).unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();

        // 2.0 * 1.195 + 1.0 * (-1.217) = 1.173
        assert!(approx_eq(find(&out, 1).swish_score.unwrap(), 1.173, 1e-9));
    }

    #[test]
    fn negative_weight_penalizes_turnovers() {
        let table = StatTable::new(vec![
            scored_row(1, 2021, 1.0, 2.0),
            scored_row(2, 2021, 1.0, -2.0),
        ])
        .unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();

        // Same points z-score; the low-turnover player scores higher.
        assert!(find(&out, 2).swish_score.unwrap() > find(&out, 1).swish_score.unwrap());
    }

    #[test]
    fn min_ranking_shares_rank_and_skips() {
        let table = StatTable::new(vec![
            scored_row(1, 2021, 3.0, 0.0),
            scored_row(2, 2021, 3.0, 0.0),
            scored_row(3, 2021, 1.0, 0.0),
        ])
        .unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();

        // Two tied for best share rank 1; next distinct score is rank 3.
        assert_eq!(find(&out, 1).overall_rank, Some(1));
        assert_eq!(find(&out, 2).overall_rank, Some(1));
        assert_eq!(find(&out, 3).overall_rank, Some(3));
    }

    #[test]
    fn ranks_are_season_scoped() {
        let table = StatTable::new(vec![
            scored_row(1, 2020, 5.0, 0.0),
            scored_row(2, 2020, 1.0, 0.0),
            scored_row(3, 2021, 2.0, 0.0),
            scored_row(4, 2021, 4.0, 0.0),
        ])
        .unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();

        assert_eq!(find(&out, 1).overall_rank, Some(1));
        assert_eq!(find(&out, 2).overall_rank, Some(2));
        assert_eq!(find(&out, 4).overall_rank, Some(1));
        assert_eq!(find(&out, 3).overall_rank, Some(2));
    }

    #[test]
    fn rank_monotonic_in_score() {
        let table = StatTable::new(vec![
            scored_row(1, 2021, 0.5, 0.2),
            scored_row(2, 2021, -1.0, 1.5),
            scored_row(3, 2021, 2.5, -0.5),
            scored_row(4, 2021, 1.0, 1.0),
        ])
        .unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();

        for a in out.rows() {
            for b in out.rows() {
                if a.swish_score.unwrap() > b.swish_score.unwrap() {
                    assert!(a.overall_rank.unwrap() <= b.overall_rank.unwrap());
                }
            }
        }
    }

    #[test]
    fn missing_z_column_skipped_with_others_applied() {
        // Only points z-scores exist; the turnover weight is skipped.
        let mut r1 = StatRow::new(1, SeasonToken::from_start_year(2021));
        r1.points_z_score = Some(2.0);
        let mut r2 = StatRow::new(2, SeasonToken::from_start_year(2021));
        r2.points_z_score = Some(-2.0);

        let table = StatTable::new(vec![r1, r2]).unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();

        assert!(approx_eq(find(&out, 1).swish_score.unwrap(), 2.0 * 1.195, 1e-9));
        assert!(approx_eq(find(&out, 2).swish_score.unwrap(), -2.0 * 1.195, 1e-9));
    }

    #[test]
    fn no_usable_weights_scores_zero_for_all() {
        let mut r1 = StatRow::new(1, SeasonToken::from_start_year(2021));
        r1.rebounds_z_score = Some(1.0);
        let r2 = StatRow::new(2, SeasonToken::from_start_year(2021));

        let table = StatTable::new(vec![r1, r2]).unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();

        assert_eq!(find(&out, 1).swish_score, Some(0.0));
        assert_eq!(find(&out, 2).swish_score, Some(0.0));
        assert_eq!(find(&out, 1).overall_rank, Some(1));
        assert_eq!(find(&out, 2).overall_rank, Some(1));
    }

    #[test]
    fn row_count_preserved() {
        let rows: Vec<StatRow> = (1..=25)
            .map(|i| scored_row(i, 2021, i as f64 * 0.1, 0.0))
            .collect();
        let table = StatTable::new(rows).unwrap();
        let out = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap();
        assert_eq!(out.len(), 25);
    }

    #[test]
    fn empty_input_is_fatal() {
        let table = StatTable::new(Vec::new()).unwrap();
        let err = CompositeScorer::new(weights(), RankMethod::Min).apply(table).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput { .. }));
    }
}
