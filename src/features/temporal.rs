// Year-over-year deltas, computed independently per player.

use tracing::{info, warn};

use crate::features::PipelineError;
use crate::model::{StatKey, StatTable};

const STAGE: &str = "temporal differ";

/// Adds `<stat>_yoy_diff = value(season_n) − value(season_{n−1})` for a
/// configured stat set, grouped by player and ordered chronologically.
///
/// "Previous season" means the player's previous *observed* season; a gap
/// year does not reset the diff. A diff is present only when the stat is
/// present on both sides. The first observed season of every player has
/// every diff column absent — never zero.
#[derive(Debug, Clone)]
pub struct TemporalDiffer {
    stats: Vec<StatKey>,
}

impl TemporalDiffer {
    pub fn new(stats: Vec<StatKey>) -> Self {
        Self { stats }
    }

    pub fn apply(&self, mut table: StatTable) -> Result<StatTable, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::EmptyInput { stage: STAGE });
        }

        let supported: Vec<StatKey> = self
            .stats
            .iter()
            .copied()
            .filter(|stat| {
                if stat.supports_yoy_diff() {
                    true
                } else {
                    warn!(stat = stat.name(), "stat has no yoy diff column; skipping");
                    false
                }
            })
            .collect();

        for group in table.player_groups_mut() {
            // First observed season: diffs are undefined, not zero. Cleared
            // explicitly so re-running on previously annotated rows stays
            // idempotent.
            for stat in &supported {
                stat.set_yoy_diff(&mut group[0], None);
            }

            for i in 1..group.len() {
                for stat in &supported {
                    let prev = stat.value(&group[i - 1]);
                    let cur = stat.value(&group[i]);
                    let diff = cur.zip(prev).map(|(c, p)| c - p);
                    stat.set_yoy_diff(&mut group[i], diff);
                }
            }
        }

        info!(rows = table.len(), stats = supported.len(), "year-over-year diffs computed");
        Ok(table)
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

    fn row(player_id: i64, start_year: u16, points: f64) -> StatRow {
        let mut r = StatRow::new(player_id, SeasonToken::from_start_year(start_year));
        r.points = points;
        r
    }

    fn diff_stats() -> Vec<StatKey> {
        vec![StatKey::Points, StatKey::UsageRate, StatKey::SwishScore]
    }

    #[test]
    fn first_season_diff_is_absent() {
        let table = StatTable::new(vec![row(1, 2020, 10.0), row(1, 2021, 15.0)]).unwrap();
        let out = TemporalDiffer::new(diff_stats()).apply(table).unwrap();

        assert!(out.rows()[0].points_yoy_diff.is_none());
        assert!(approx_eq(out.rows()[1].points_yoy_diff.unwrap(), 5.0, 1e-9));
    }

    #[test]
    fn diff_is_per_player_not_global() {
        let table = StatTable::new(vec![
            row(1, 2020, 10.0),
            row(1, 2021, 12.0),
            row(2, 2020, 30.0),
            row(2, 2021, 25.0),
        ])
        .unwrap();
        let out = TemporalDiffer::new(diff_stats()).apply(table).unwrap();

        let by_key = |pid: i64, year: u16| {
            out.rows()
                .iter()
                .find(|r| r.player_id == pid && r.season.start_year() == year)
                .unwrap()
        };
        assert!(approx_eq(by_key(1, 2021).points_yoy_diff.unwrap(), 2.0, 1e-9));
        assert!(approx_eq(by_key(2, 2021).points_yoy_diff.unwrap(), -5.0, 1e-9));
        assert!(by_key(1, 2020).points_yoy_diff.is_none());
        assert!(by_key(2, 2020).points_yoy_diff.is_none());
    }

    #[test]
    fn unsorted_input_is_ordered_chronologically() {
        // Table construction normalizes order, so arrival order is irrelevant.
        let table = StatTable::new(vec![row(1, 2022, 20.0), row(1, 2020, 10.0), row(1, 2021, 16.0)])
            .unwrap();
        let out = TemporalDiffer::new(diff_stats()).apply(table).unwrap();

        let diffs: Vec<Option<f64>> = out.rows().iter().map(|r| r.points_yoy_diff).collect();
        assert!(diffs[0].is_none());
        assert!(approx_eq(diffs[1].unwrap(), 6.0, 1e-9));
        assert!(approx_eq(diffs[2].unwrap(), 4.0, 1e-9));
    }

    #[test]
    fn gap_season_diffs_against_previous_observed() {
        let table = StatTable::new(vec![row(1, 2019, 10.0), row(1, 2022, 18.0)]).unwrap();
        let out = TemporalDiffer::new(diff_stats()).apply(table).unwrap();

        assert!(approx_eq(out.rows()[1].points_yoy_diff.unwrap(), 8.0, 1e-9));
    }

    #[test]
    fn optional_stat_missing_on_either_side_yields_absent_diff() {
        let mut a = row(1, 2020, 10.0);
        a.usage_rate = Some(20.0);
        let b = row(1, 2021, 12.0); // no usage_rate
        let mut c = row(1, 2022, 14.0);
        c.usage_rate = Some(26.0);

        let table = StatTable::new(vec![a, b, c]).unwrap();
        let out = TemporalDiffer::new(diff_stats()).apply(table).unwrap();

        assert!(out.rows()[1].usage_rate_yoy_diff.is_none());
        // 2022 diffs against 2021, which has no usage_rate either.
        assert!(out.rows()[2].usage_rate_yoy_diff.is_none());
        // Points diff unaffected.
        assert!(approx_eq(out.rows()[2].points_yoy_diff.unwrap(), 2.0, 1e-9));
    }

    #[test]
    fn swish_score_diff_uses_carried_scores() {
        let mut a = row(1, 2020, 10.0);
        a.swish_score = Some(3.0);
        let mut b = row(1, 2021, 12.0);
        b.swish_score = Some(4.5);

        let table = StatTable::new(vec![a, b]).unwrap();
        let out = TemporalDiffer::new(diff_stats()).apply(table).unwrap();

        assert!(approx_eq(out.rows()[1].swish_score_yoy_diff.unwrap(), 1.5, 1e-9));
    }

    #[test]
    fn rerun_clears_stale_first_season_diffs() {
        let mut a = row(1, 2020, 10.0);
        a.points_yoy_diff = Some(99.0); // stale value from a previous run
        let b = row(1, 2021, 15.0);

        let table = StatTable::new(vec![a, b]).unwrap();
        let out = TemporalDiffer::new(diff_stats()).apply(table).unwrap();

        assert!(out.rows()[0].points_yoy_diff.is_none());
    }

    #[test]
    fn empty_input_is_fatal() {
        let table = StatTable::new(Vec::new()).unwrap();
        let err = TemporalDiffer::new(diff_stats()).apply(table).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput { .. }));
    }
}
