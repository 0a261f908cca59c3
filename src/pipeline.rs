// Full feature-engineering and scoring pipeline.

use tracing::info;

use crate::config::Config;
use crate::features::{
    ExperienceAnnotator, PerMinuteNormalizer, PipelineError, TeamContextAttributor, TemporalDiffer,
};
use crate::model::StatTable;
use crate::scoring::{CompositeScorer, ZScoreStandardizer};

/// Run the six pipeline stages in dependency order:
///
/// normalizer → differ → annotator → attributor → standardizer → scorer
///
/// Each stage is a total function from one table to the next with no
/// shared state, so the whole pipeline is synchronous, side-effect-free,
/// and idempotent given the same raw input.
pub fn run(table: StatTable, config: &Config) -> Result<StatTable, PipelineError> {
    info!(rows = table.len(), "pipeline starting");

    let table = PerMinuteNormalizer::new(config.stats.per_minute.clone()).apply(table)?;
    let table = TemporalDiffer::new(config.stats.yoy_diff.clone()).apply(table)?;
    let table = ExperienceAnnotator::new().apply(table)?;
    let table = TeamContextAttributor::new().apply(table)?;
    let table = ZScoreStandardizer::new(config.stats.z_score.clone()).apply(table)?;
    let table =
        CompositeScorer::new(config.weights.clone(), config.scoring.rank_method).apply(table)?;

    info!(rows = table.len(), "pipeline finished");
    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SeasonToken, StatRow, StatTable};

    fn row(player_id: i64, start_year: u16, team: &str, points: f64, usage: f64) -> StatRow {
        let mut r = StatRow::new(player_id, SeasonToken::from_start_year(start_year));
        r.team = Some(team.to_string());
        r.player_age = Some(24.0 + player_id as f64);
        r.games_played = 70;
        r.avg_minutes = Some(30.0);
        r.points = points;
        r.rebounds = 6.0 + player_id as f64;
        r.assists = 4.0;
        r.steals = 1.0;
        r.blocks = 0.5;
        r.turnovers = 2.0 + 0.1 * player_id as f64;
        r.three_pointers_made = 2.0;
        r.field_goal_pct = 0.45 + 0.01 * player_id as f64;
        r.free_throw_pct = 0.80;
        r.usage_rate = Some(usage);
        r.true_shooting_pct = Some(0.57);
        r
    }

    fn sample_table() -> StatTable {
        StatTable::new(vec![
            row(1, 2021, "X", 25.0, 28.0),
            row(2, 2021, "X", 18.0, 22.0),
            row(3, 2021, "Y", 15.0, 19.0),
            row(1, 2022, "X", 27.0, 29.0),
            row(3, 2022, "X", 16.0, 20.0),
        ])
        .unwrap()
    }

    #[test]
    fn all_derived_columns_populated() {
        let out = run(sample_table(), &Config::default()).unwrap();

        for r in out.rows() {
            assert!(r.points_per_36_min.is_some());
            assert!(r.years_in_league.is_some());
            assert!(r.player_age_sq.is_some());
            assert!(r.vacated_usage.is_some());
            assert!(r.points_z_score.is_some());
            assert!(r.turnovers_z_score.is_some());
            assert!(r.swish_score.is_some());
            assert!(r.overall_rank.is_some());
        }
    }

    #[test]
    fn pipeline_is_idempotent_on_same_raw_input() {
        let config = Config::default();
        let once = run(sample_table(), &config).unwrap();
        let again = run(sample_table(), &config).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn empty_table_halts_pipeline() {
        let table = StatTable::new(Vec::new()).unwrap();
        assert!(run(table, &Config::default()).is_err());
    }
}
