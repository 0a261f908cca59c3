// Season-cohort z-score standardization.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::features::PipelineError;
use crate::model::{SeasonToken, StatKey, StatTable};

const STAGE: &str = "z-score standardizer";

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Mean and standard deviation for one stat within a season cohort.
#[derive(Debug, Clone, Copy)]
pub struct CohortStats {
    pub mean: f64,
    pub stdev: f64,
    pub n: usize,
}

/// Compute mean and sample standard deviation (N−1 denominator) for a
/// slice of values.
///
/// The sample form is used because a one-row cohort carries no spread
/// information: with fewer than 2 values the deviation is undefined and
/// reported as 0.0, which downstream maps to a zero z-score.
pub fn cohort_stats(values: &[f64]) -> CohortStats {
    let n = values.len();
    if n < 2 {
        let mean = values.first().copied().unwrap_or(0.0);
        return CohortStats { mean, stdev: 0.0, n };
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    CohortStats {
        mean,
        stdev: variance.sqrt(),
        n,
    }
}

/// Compute a z-score against cohort stats.
///
/// Returns exactly 0.0 for a degenerate cohort (zero, near-zero, or NaN
/// deviation) — never NaN, never a division fault.
pub fn z_score(value: f64, stats: &CohortStats) -> f64 {
    if !stats.stdev.is_finite() || stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

/// Standardizes a configured set of stats within each season cohort.
///
/// Cohort = all rows sharing a season; statistics are never pooled across
/// seasons. This stage is direction-agnostic: turnovers come out with the
/// same sign convention as everything else, and the composite scorer's
/// signed weights handle "lower is better".
#[derive(Debug, Clone)]
pub struct ZScoreStandardizer {
    stats: Vec<StatKey>,
}

impl ZScoreStandardizer {
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
                if stat.supports_z_score() {
                    true
                } else {
                    warn!(stat = stat.name(), "stat has no z-score column; skipping");
                    false
                }
            })
            .collect();

        for stat in &supported {
            let mut values_by_season: HashMap<SeasonToken, Vec<f64>> = HashMap::new();
            for row in table.rows() {
                if let Some(v) = stat.value(row) {
                    values_by_season.entry(row.season).or_default().push(v);
                }
            }
            let stats_by_season: HashMap<SeasonToken, CohortStats> = values_by_season
                .into_iter()
                .map(|(season, values)| (season, cohort_stats(&values)))
                .collect();

            for row in table.rows_mut() {
                let z = stat
                    .value(row)
                    .and_then(|v| stats_by_season.get(&row.season).map(|s| z_score(v, s)));
                stat.set_z_score(row, z);
            }
        }

        info!(
            rows = table.len(),
            stats = supported.len(),
            seasons = table.seasons().len(),
            "z-scores standardized per season cohort"
        );
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
