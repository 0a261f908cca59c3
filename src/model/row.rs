// Typed player-season row schema.
//
// The row carries every raw input column as a named field (optional where
// the upstream source can omit it) and every derived column as an Option
// that starts out absent and is filled by exactly one pipeline stage.

use serde::{Deserialize, Serialize};

use crate::model::season::SeasonToken;

/// One player-season observation.
///
/// Raw counting stats are per-game averages as delivered by the stats
/// provider. Derived fields are `None` until the owning stage runs; a
/// stage either fills a column for every eligible row or leaves it absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    // -- identity --
    pub player_id: i64,
    pub season: SeasonToken,
    pub team: Option<String>,
    pub player_age: Option<f64>,
    pub games_played: u32,
    pub avg_minutes: Option<f64>,

    // -- counting stats --
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub field_goals_made: f64,
    pub field_goal_attempts: f64,
    pub free_throws_made: f64,
    pub free_throw_attempts: f64,
    pub three_pointers_made: f64,
    pub three_point_attempts: f64,

    // -- rate stats --
    pub field_goal_pct: f64,
    pub free_throw_pct: f64,
    pub three_point_pct: f64,
    pub usage_rate: Option<f64>,
    pub true_shooting_pct: Option<f64>,

    // -- derived: per-36-minute rates --
    #[serde(default)]
    pub points_per_36_min: Option<f64>,
    #[serde(default)]
    pub rebounds_per_36_min: Option<f64>,
    #[serde(default)]
    pub assists_per_36_min: Option<f64>,
    #[serde(default)]
    pub steals_per_36_min: Option<f64>,
    #[serde(default)]
    pub blocks_per_36_min: Option<f64>,
    #[serde(default)]
    pub turnovers_per_36_min: Option<f64>,
    #[serde(default)]
    pub three_pointers_made_per_36_min: Option<f64>,

    // -- derived: year-over-year deltas --
    #[serde(default)]
    pub points_yoy_diff: Option<f64>,
    #[serde(default)]
    pub rebounds_yoy_diff: Option<f64>,
    #[serde(default)]
    pub assists_yoy_diff: Option<f64>,
    #[serde(default)]
    pub steals_yoy_diff: Option<f64>,
    #[serde(default)]
    pub blocks_yoy_diff: Option<f64>,
    #[serde(default)]
    pub turnovers_yoy_diff: Option<f64>,
    #[serde(default)]
    pub three_pointers_made_yoy_diff: Option<f64>,
    #[serde(default)]
    pub swish_score_yoy_diff: Option<f64>,
    #[serde(default)]
    pub usage_rate_yoy_diff: Option<f64>,
    #[serde(default)]
    pub true_shooting_pct_yoy_diff: Option<f64>,

    // -- derived: age and experience --
    #[serde(default)]
    pub player_age_sq: Option<f64>,
    #[serde(default)]
    pub years_in_league: Option<u32>,

    // -- derived: team context --
    #[serde(default)]
    pub vacated_usage: Option<f64>,

    // -- derived: season-cohort z-scores --
    #[serde(default)]
    pub points_z_score: Option<f64>,
    #[serde(default)]
    pub rebounds_z_score: Option<f64>,
    #[serde(default)]
    pub assists_z_score: Option<f64>,
    #[serde(default)]
    pub steals_z_score: Option<f64>,
    #[serde(default)]
    pub blocks_z_score: Option<f64>,
    #[serde(default)]
    pub turnovers_z_score: Option<f64>,
    #[serde(default)]
    pub three_pointers_made_z_score: Option<f64>,
    #[serde(default)]
    pub field_goal_pct_z_score: Option<f64>,
    #[serde(default)]
    pub free_throw_pct_z_score: Option<f64>,

    // -- derived: composite score and rank --
    #[serde(default)]
    pub swish_score: Option<f64>,
    #[serde(default)]
    pub overall_rank: Option<u32>,
}

impl StatRow {
    /// A row with identity set and every stat zeroed / absent. Callers fill
    /// in the fields they have; providers and tests build rows this way.
    pub fn new(player_id: i64, season: SeasonToken) -> Self {
        Self {
            player_id,
            season,
            team: None,
            player_age: None,
            games_played: 0,
            avg_minutes: None,
            points: 0.0,
            rebounds: 0.0,
            assists: 0.0,
            steals: 0.0,
            blocks: 0.0,
            turnovers: 0.0,
            field_goals_made: 0.0,
            field_goal_attempts: 0.0,
            free_throws_made: 0.0,
            free_throw_attempts: 0.0,
            three_pointers_made: 0.0,
            three_point_attempts: 0.0,
            field_goal_pct: 0.0,
            free_throw_pct: 0.0,
            three_point_pct: 0.0,
            usage_rate: None,
            true_shooting_pct: None,
            points_per_36_min: None,
            rebounds_per_36_min: None,
            assists_per_36_min: None,
            steals_per_36_min: None,
            blocks_per_36_min: None,
            turnovers_per_36_min: None,
            three_pointers_made_per_36_min: None,
            points_yoy_diff: None,
            rebounds_yoy_diff: None,
            assists_yoy_diff: None,
            steals_yoy_diff: None,
            blocks_yoy_diff: None,
            turnovers_yoy_diff: None,
            three_pointers_made_yoy_diff: None,
            swish_score_yoy_diff: None,
            usage_rate_yoy_diff: None,
            true_shooting_pct_yoy_diff: None,
            player_age_sq: None,
            years_in_league: None,
            vacated_usage: None,
            points_z_score: None,
            rebounds_z_score: None,
            assists_z_score: None,
            steals_z_score: None,
            blocks_z_score: None,
            turnovers_z_score: None,
            three_pointers_made_z_score: None,
            field_goal_pct_z_score: None,
            free_throw_pct_z_score: None,
            swish_score: None,
            overall_rank: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stat keys
// ---------------------------------------------------------------------------

/// Names a stat that pipeline stages can be configured to operate on.
///
/// This is the typed counterpart of a column name: configuration files list
/// stat keys, and each stage resolves a key to the row fields it reads and
/// writes. Not every key supports every derivation — the setters return
/// `false` for unsupported combinations so stages can warn and skip, which
/// is the same policy as a missing column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    ThreePointersMade,
    FieldGoalPct,
    FreeThrowPct,
    UsageRate,
    TrueShootingPct,
    SwishScore,
}

impl StatKey {
    /// Snake-case name, matching the configuration spelling.
    pub fn name(&self) -> &'static str {
        match self {
            StatKey::Points => "points",
            StatKey::Rebounds => "rebounds",
            StatKey::Assists => "assists",
            StatKey::Steals => "steals",
            StatKey::Blocks => "blocks",
            StatKey::Turnovers => "turnovers",
            StatKey::ThreePointersMade => "three_pointers_made",
            StatKey::FieldGoalPct => "field_goal_pct",
            StatKey::FreeThrowPct => "free_throw_pct",
            StatKey::UsageRate => "usage_rate",
            StatKey::TrueShootingPct => "true_shooting_pct",
            StatKey::SwishScore => "swish_score",
        }
    }

    /// Whether this stat has a per-36-minute column.
    pub fn supports_per_36(&self) -> bool {
        matches!(
            self,
            StatKey::Points
                | StatKey::Rebounds
                | StatKey::Assists
                | StatKey::Steals
                | StatKey::Blocks
                | StatKey::Turnovers
                | StatKey::ThreePointersMade
        )
    }

    /// Whether this stat has a year-over-year diff column.
    pub fn supports_yoy_diff(&self) -> bool {
        !matches!(self, StatKey::FieldGoalPct | StatKey::FreeThrowPct)
    }

    /// Whether this stat has a season-cohort z-score column.
    pub fn supports_z_score(&self) -> bool {
        !matches!(
            self,
            StatKey::UsageRate | StatKey::TrueShootingPct | StatKey::SwishScore
        )
    }

    /// The raw value of this stat on a row, if present.
    pub fn value(&self, row: &StatRow) -> Option<f64> {
        match self {
            StatKey::Points => Some(row.points),
            StatKey::Rebounds => Some(row.rebounds),
            StatKey::Assists => Some(row.assists),
            StatKey::Steals => Some(row.steals),
            StatKey::Blocks => Some(row.blocks),
            StatKey::Turnovers => Some(row.turnovers),
            StatKey::ThreePointersMade => Some(row.three_pointers_made),
            StatKey::FieldGoalPct => Some(row.field_goal_pct),
            StatKey::FreeThrowPct => Some(row.free_throw_pct),
            StatKey::UsageRate => row.usage_rate,
            StatKey::TrueShootingPct => row.true_shooting_pct,
            StatKey::SwishScore => row.swish_score,
        }
    }

    /// Write the per-36-minute value for this stat. Returns `false` when the
    /// stat has no per-36 column (rate stats and composites).
    pub fn set_per_36(&self, row: &mut StatRow, value: Option<f64>) -> bool {
        let slot = match self {
            StatKey::Points => &mut row.points_per_36_min,
            StatKey::Rebounds => &mut row.rebounds_per_36_min,
            StatKey::Assists => &mut row.assists_per_36_min,
            StatKey::Steals => &mut row.steals_per_36_min,
            StatKey::Blocks => &mut row.blocks_per_36_min,
            StatKey::Turnovers => &mut row.turnovers_per_36_min,
            StatKey::ThreePointersMade => &mut row.three_pointers_made_per_36_min,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Read the per-36-minute value for this stat, if the column exists.
    pub fn per_36(&self, row: &StatRow) -> Option<f64> {
        match self {
            StatKey::Points => row.points_per_36_min,
            StatKey::Rebounds => row.rebounds_per_36_min,
            StatKey::Assists => row.assists_per_36_min,
            StatKey::Steals => row.steals_per_36_min,
            StatKey::Blocks => row.blocks_per_36_min,
            StatKey::Turnovers => row.turnovers_per_36_min,
            StatKey::ThreePointersMade => row.three_pointers_made_per_36_min,
            _ => None,
        }
    }

    /// Write the year-over-year delta for this stat. Returns `false` when
    /// the stat has no diff column.
    pub fn set_yoy_diff(&self, row: &mut StatRow, value: Option<f64>) -> bool {
        let slot = match self {
            StatKey::Points => &mut row.points_yoy_diff,
            StatKey::Rebounds => &mut row.rebounds_yoy_diff,
            StatKey::Assists => &mut row.assists_yoy_diff,
            StatKey::Steals => &mut row.steals_yoy_diff,
            StatKey::Blocks => &mut row.blocks_yoy_diff,
            StatKey::Turnovers => &mut row.turnovers_yoy_diff,
            StatKey::ThreePointersMade => &mut row.three_pointers_made_yoy_diff,
            StatKey::SwishScore => &mut row.swish_score_yoy_diff,
            StatKey::UsageRate => &mut row.usage_rate_yoy_diff,
            StatKey::TrueShootingPct => &mut row.true_shooting_pct_yoy_diff,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Read the year-over-year delta for this stat, if the column exists.
    pub fn yoy_diff(&self, row: &StatRow) -> Option<f64> {
        match self {
            StatKey::Points => row.points_yoy_diff,
            StatKey::Rebounds => row.rebounds_yoy_diff,
            StatKey::Assists => row.assists_yoy_diff,
            StatKey::Steals => row.steals_yoy_diff,
            StatKey::Blocks => row.blocks_yoy_diff,
            StatKey::Turnovers => row.turnovers_yoy_diff,
            StatKey::ThreePointersMade => row.three_pointers_made_yoy_diff,
            StatKey::SwishScore => row.swish_score_yoy_diff,
            StatKey::UsageRate => row.usage_rate_yoy_diff,
            StatKey::TrueShootingPct => row.true_shooting_pct_yoy_diff,
            _ => None,
        }
    }

    /// Write the season-cohort z-score for this stat. Returns `false` when
    /// the stat has no z-score column.
    pub fn set_z_score(&self, row: &mut StatRow, value: Option<f64>) -> bool {
        let slot = match self {
            StatKey::Points => &mut row.points_z_score,
            StatKey::Rebounds => &mut row.rebounds_z_score,
            StatKey::Assists => &mut row.assists_z_score,
            StatKey::Steals => &mut row.steals_z_score,
            StatKey::Blocks => &mut row.blocks_z_score,
            StatKey::Turnovers => &mut row.turnovers_z_score,
            StatKey::ThreePointersMade => &mut row.three_pointers_made_z_score,
            StatKey::FieldGoalPct => &mut row.field_goal_pct_z_score,
            StatKey::FreeThrowPct => &mut row.free_throw_pct_z_score,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Read the season-cohort z-score for this stat, if the column exists.
    pub fn z_score(&self, row: &StatRow) -> Option<f64> {
        match self {
            StatKey::Points => row.points_z_score,
            StatKey::Rebounds => row.rebounds_z_score,
            StatKey::Assists => row.assists_z_score,
            StatKey::Steals => row.steals_z_score,
            StatKey::Blocks => row.blocks_z_score,
            StatKey::Turnovers => row.turnovers_z_score,
            StatKey::ThreePointersMade => row.three_pointers_made_z_score,
            StatKey::FieldGoalPct => row.field_goal_pct_z_score,
            StatKey::FreeThrowPct => row.free_throw_pct_z_score,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
