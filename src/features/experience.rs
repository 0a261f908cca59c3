// Age-curve and league-experience features.

use tracing::{info, warn};

use crate::features::PipelineError;
use crate::model::StatTable;

const STAGE: &str = "experience annotator";

/// Adds `player_age_sq = player_age²` (modeling the age curve) and
/// `years_in_league = start_year − rookie_start_year`.
///
/// The rookie season is the minimum start year observed for the player
/// across the whole table, so experience is retrospective and stable: a
/// player's 2019 row reports the same rookie year whether or not later
/// seasons are present. A player with a single observed season has
/// `years_in_league = 0`.
#[derive(Debug, Clone, Default)]
pub struct ExperienceAnnotator;

impl ExperienceAnnotator {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, mut table: StatTable) -> Result<StatTable, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::EmptyInput { stage: STAGE });
        }

        let age_present = table.rows().iter().any(|r| r.player_age.is_some());
        if !age_present {
            warn!("player_age is absent for every row; skipping player_age_sq");
        }

        for group in table.player_groups_mut() {
            // Groups are sorted chronologically, so the first row holds the
            // rookie season.
            let rookie_year = group[0].season.start_year();
            for row in group.iter_mut() {
                row.years_in_league = Some(u32::from(row.season.start_year() - rookie_year));
                row.player_age_sq = if age_present {
                    row.player_age.map(|age| age * age)
                } else {
                    None
                };
            }
        }

        info!(rows = table.len(), "age and experience features computed");
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
