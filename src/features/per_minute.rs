// Per-36-minute normalization of counting stats.

use tracing::{info, warn};

use crate::features::PipelineError;
use crate::model::{StatKey, StatTable};

const STAGE: &str = "per-minute normalizer";

/// Derives `<stat>_per_36_min = stat / avg_minutes * 36` for a configured
/// set of counting stats.
///
/// Output is restricted to rows with `avg_minutes > 0`; zero- or
/// missing-minute rows are dropped rather than zero-filled, since a rate
/// is undefined without a minutes denominator. If `avg_minutes` is absent
/// for every row the stage returns its input unchanged — a degraded but
/// safe outcome, logged as a warning.
#[derive(Debug, Clone)]
pub struct PerMinuteNormalizer {
    stats: Vec<StatKey>,
}

impl PerMinuteNormalizer {
    pub fn new(stats: Vec<StatKey>) -> Self {
        Self { stats }
    }

    pub fn apply(&self, mut table: StatTable) -> Result<StatTable, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::EmptyInput { stage: STAGE });
        }

        if table.rows().iter().all(|r| r.avg_minutes.is_none()) {
            warn!("avg_minutes is absent for every row; skipping per-minute stats");
            return Ok(table);
        }

        let supported: Vec<StatKey> = self
            .stats
            .iter()
            .copied()
            .filter(|stat| {
                if stat.supports_per_36() {
                    true
                } else {
                    warn!(stat = stat.name(), "stat has no per-36 column; skipping");
                    false
                }
            })
            .collect();

        let before = table.len();
        table.retain(|r| r.avg_minutes.is_some_and(|m| m > 0.0));
        let dropped = before - table.len();
        if dropped > 0 {
            info!(dropped, "dropped rows without positive avg_minutes");
        }

        for row in table.rows_mut() {
            let Some(minutes) = row.avg_minutes else {
                continue;
            };
            for stat in &supported {
                let per_36 = stat.value(row).map(|v| v / minutes * 36.0);
                stat.set_per_36(row, per_36);
            }
        }

        info!(rows = table.len(), stats = supported.len(), "per-minute stats computed");
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

    fn row(player_id: i64, minutes: Option<f64>, points: f64) -> StatRow {
        let mut r = StatRow::new(player_id, SeasonToken::from_start_year(2022));
        r.avg_minutes = minutes;
        r.points = points;
        r.rebounds = 8.0;
        r.turnovers = 2.0;
        r
    }

    fn default_stats() -> Vec<StatKey> {
        vec![
            StatKey::Points,
            StatKey::Rebounds,
            StatKey::Assists,
            StatKey::Steals,
            StatKey::Blocks,
            StatKey::Turnovers,
            StatKey::ThreePointersMade,
        ]
    }

    #[test]
    fn per_36_formula_exact() {
        let table = StatTable::new(vec![row(1, Some(30.0), 24.0)]).unwrap();
        let out = PerMinuteNormalizer::new(default_stats()).apply(table).unwrap();

        // 24 points in 30 minutes -> 24 / 30 * 36 = 28.8
        let r = &out.rows()[0];
        assert!(approx_eq(r.points_per_36_min.unwrap(), 28.8, 1e-9));
        assert!(approx_eq(r.rebounds_per_36_min.unwrap(), 8.0 / 30.0 * 36.0, 1e-9));
        assert!(approx_eq(r.turnovers_per_36_min.unwrap(), 2.0 / 30.0 * 36.0, 1e-9));
    }

    #[test]
    fn zero_and_missing_minute_rows_dropped() {
        let table = StatTable::new(vec![
            row(1, Some(30.0), 20.0),
            row(2, Some(0.0), 10.0),
            row(3, None, 15.0),
        ])
        .unwrap();
        let out = PerMinuteNormalizer::new(default_stats()).apply(table).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0].player_id, 1);
    }

    #[test]
    fn minutes_absent_everywhere_returns_input_unchanged() {
        let table = StatTable::new(vec![row(1, None, 20.0), row(2, None, 10.0)]).unwrap();
        let out = PerMinuteNormalizer::new(default_stats())
            .apply(table.clone())
            .unwrap();

        assert_eq!(out, table);
        assert!(out.rows()[0].points_per_36_min.is_none());
    }

    #[test]
    fn unsupported_stat_skipped_without_error() {
        let table = StatTable::new(vec![row(1, Some(30.0), 24.0)]).unwrap();
        let out = PerMinuteNormalizer::new(vec![StatKey::Points, StatKey::FieldGoalPct])
            .apply(table)
            .unwrap();

        let r = &out.rows()[0];
        assert!(r.points_per_36_min.is_some());
    }

    #[test]
    fn empty_input_is_fatal() {
        let table = StatTable::new(Vec::new()).unwrap();
        let err = PerMinuteNormalizer::new(default_stats()).apply(table).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput { .. }));
    }

    #[test]
    fn row_order_preserved_after_restriction() {
        let table = StatTable::new(vec![
            row(3, Some(20.0), 10.0),
            row(1, Some(25.0), 12.0),
            row(2, None, 9.0),
            row(4, Some(18.0), 8.0),
        ])
        .unwrap();
        let out = PerMinuteNormalizer::new(default_stats()).apply(table).unwrap();

        let ids: Vec<i64> = out.rows().iter().map(|r| r.player_id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }
}
