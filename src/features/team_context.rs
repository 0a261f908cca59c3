// Vacated-usage attribution: usage freed up by departed teammates,
// credited to the team's following season.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::features::PipelineError;
use crate::model::{SeasonToken, StatTable};

const STAGE: &str = "team context attributor";

/// Quantifies the usage rate "vacated" when players leave a team and
/// attributes it to the next season for players on that team.
///
/// Two temporal joins are involved. The player-level one decides whether a
/// row is a "stayer": same team as the player's previous observed season.
/// Each stayer's *previous-season* usage counts as retained for that
/// previous (team, season); whatever usage the team carried that season
/// and did not retain was vacated by departures:
///
/// ```text
/// vacated(team, season) = total_usage(team, season) − stayers_usage(team, season)
/// ```
///
/// The team-level join then shifts the aggregate forward one season:
/// a row receives `vacated(row.team, row.season.prev())`. A team with no
/// vacated record for the prior season gets `0.0` — the absence of
/// departures is a valid zero, not an unknown. The column is defined only
/// for rows carrying both `team` and `usage_rate`; rows that changed teams
/// mid-season are not modeled (each row carries the single team the
/// provider reported, taken at face value).
#[derive(Debug, Clone, Default)]
pub struct TeamContextAttributor;

impl TeamContextAttributor {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, mut table: StatTable) -> Result<StatTable, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::EmptyInput { stage: STAGE });
        }

        if table.rows().iter().all(|r| r.team.is_none()) {
            warn!("team is absent for every row; skipping vacated usage");
            return Ok(table);
        }
        if table.rows().iter().all(|r| r.usage_rate.is_none()) {
            warn!("usage_rate is absent for every row; skipping vacated usage");
            return Ok(table);
        }

        let rows = table.rows();

        // Total usage per (team, season).
        let mut total_usage: HashMap<(String, SeasonToken), f64> = HashMap::new();
        for row in rows {
            let (Some(team), Some(usage)) = (row.team.as_deref(), row.usage_rate) else {
                continue;
            };
            *total_usage.entry((team.to_string(), row.season)).or_default() += usage;
        }

        // Retained usage per (team, season): a stayer's previous-season
        // usage stays with the team. Rows are sorted (player, season), so
        // the previous observed season is the previous row of the player.
        let mut stayers_usage: HashMap<(String, SeasonToken), f64> = HashMap::new();
        for i in 1..rows.len() {
            let (prev, cur) = (&rows[i - 1], &rows[i]);
            if prev.player_id != cur.player_id {
                continue;
            }
            let (Some(prev_team), Some(cur_team)) = (prev.team.as_deref(), cur.team.as_deref())
            else {
                continue;
            };
            if prev_team != cur_team {
                continue;
            }
            if let Some(prev_usage) = prev.usage_rate {
                *stayers_usage
                    .entry((prev_team.to_string(), prev.season))
                    .or_default() += prev_usage;
            }
        }

        // Vacated usage, keyed by the season it is attributed to.
        let vacated: HashMap<(String, SeasonToken), f64> = total_usage
            .into_iter()
            .map(|((team, season), total)| {
                let retained = stayers_usage
                    .get(&(team.clone(), season))
                    .copied()
                    .unwrap_or(0.0);
                ((team, season.next()), total - retained)
            })
            .collect();

        // Join back onto eligible rows; a missing counterpart is a zero.
        for row in table.rows_mut() {
            row.vacated_usage = match (row.team.as_deref(), row.usage_rate) {
                (Some(team), Some(_)) => Some(
                    vacated
                        .get(&(team.to_string(), row.season))
                        .copied()
                        .unwrap_or(0.0),
                ),
                _ => None,
            };
        }

        info!(rows = table.len(), teams = vacated.len(), "vacated usage attributed");
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
