// CSV-backed season tables: per-season ingestion and scored export.
//
// Input files follow the `nba_stats_<YYYY-YY>.csv` naming convention with
// one row per player. Malformed rows are skipped with a warning; a file
// whose name does not parse to a season is ignored.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{SeasonToken, StatRow, StatTable};
use crate::provider::{ProviderError, StatsProvider};

const FILE_PREFIX: &str = "nba_stats_";
const FILE_SUFFIX: &str = ".csv";

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// One season-file row. Column names are PascalCase as written by the
/// upstream exporter; unknown columns are ignored. `SwishScore` may be
/// present when re-ingesting previously scored data, which is what makes
/// the score's own year-over-year diff computable.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawSeasonRow {
    PlayerID: i64,
    #[serde(default)]
    PlayerName: Option<String>,
    #[serde(default)]
    Team: Option<String>,
    #[serde(default)]
    Season: Option<SeasonToken>,
    #[serde(default)]
    PlayerAge: Option<f64>,
    GamesPlayed: f64,
    #[serde(default)]
    AvgMinutes: Option<f64>,
    Points: f64,
    Rebounds: f64,
    Assists: f64,
    Steals: f64,
    Blocks: f64,
    Turnovers: f64,
    FieldGoalsMade: f64,
    FieldGoalAttempts: f64,
    FreeThrowsMade: f64,
    FreeThrowAttempts: f64,
    ThreePointersMade: f64,
    ThreePointAttempts: f64,
    FieldGoalPct: f64,
    FreeThrowPct: f64,
    ThreePointPct: f64,
    #[serde(default)]
    UsageRate: Option<f64>,
    #[serde(default)]
    TrueShootingPct: Option<f64>,
    #[serde(default)]
    SwishScore: Option<f64>,
}

impl RawSeasonRow {
    fn into_stat_row(self, fallback_season: SeasonToken) -> StatRow {
        let season = self.Season.unwrap_or(fallback_season);
        let mut row = StatRow::new(self.PlayerID, season);
        row.team = self.Team.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        row.player_age = self.PlayerAge;
        row.games_played = self.GamesPlayed.round() as u32;
        row.avg_minutes = self.AvgMinutes;
        row.points = self.Points;
        row.rebounds = self.Rebounds;
        row.assists = self.Assists;
        row.steals = self.Steals;
        row.blocks = self.Blocks;
        row.turnovers = self.Turnovers;
        row.field_goals_made = self.FieldGoalsMade;
        row.field_goal_attempts = self.FieldGoalAttempts;
        row.free_throws_made = self.FreeThrowsMade;
        row.free_throw_attempts = self.FreeThrowAttempts;
        row.three_pointers_made = self.ThreePointersMade;
        row.three_point_attempts = self.ThreePointAttempts;
        row.field_goal_pct = self.FieldGoalPct;
        row.free_throw_pct = self.FreeThrowPct;
        row.three_point_pct = self.ThreePointPct;
        row.usage_rate = self.UsageRate;
        row.true_shooting_pct = self.TrueShootingPct;
        row.swish_score = self.SwishScore;
        row
    }
}

/// Returns true if all given f64 values are finite (not NaN or Infinity).
fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn read_season_rows<R: Read>(
    rdr: R,
    fallback_season: SeasonToken,
) -> Result<Vec<StatRow>, ::csv::Error> {
    let mut reader = ::csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawSeasonRow>() {
        match result {
            Ok(raw) => {
                if !all_finite(&[raw.Points, raw.Rebounds, raw.Assists, raw.Turnovers]) {
                    warn!(player_id = raw.PlayerID, "skipping row with non-finite stat values");
                    continue;
                }
                rows.push(raw.into_stat_row(fallback_season));
            }
            Err(e) => {
                warn!("skipping malformed season row: {}", e);
            }
        }
    }
    Ok(rows)
}

fn read_player_names<R: Read>(rdr: R) -> Result<HashMap<i64, String>, ::csv::Error> {
    let mut reader = ::csv::Reader::from_reader(rdr);
    let mut map = HashMap::new();
    for result in reader.deserialize::<RawSeasonRow>() {
        match result {
            Ok(raw) => {
                if let Some(name) = raw.PlayerName {
                    let name = name.trim().to_string();
                    if !name.is_empty() {
                        map.insert(raw.PlayerID, name);
                    }
                }
            }
            Err(e) => {
                warn!("skipping malformed season row: {}", e);
            }
        }
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Reads raw season tables from a directory of per-season CSV files.
pub struct CsvProvider {
    season_dir: PathBuf,
}

impl CsvProvider {
    pub fn new(season_dir: impl Into<PathBuf>) -> Self {
        Self {
            season_dir: season_dir.into(),
        }
    }

    /// Season files under the directory, sorted by season.
    fn season_files(&self) -> Result<Vec<(SeasonToken, PathBuf)>, ProviderError> {
        let entries =
            std::fs::read_dir(&self.season_dir).map_err(|e| ProviderError::Io {
                path: self.season_dir.display().to_string(),
                source: e,
            })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProviderError::Io {
                path: self.season_dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(middle) = name
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            else {
                continue;
            };
            match middle.parse::<SeasonToken>() {
                Ok(season) => files.push((season, path)),
                Err(e) => {
                    warn!(file = name, "ignoring file with unparseable season: {e}");
                }
            }
        }
        files.sort_by_key(|(season, _)| *season);
        Ok(files)
    }

    fn open(&self, path: &Path) -> Result<std::fs::File, ProviderError> {
        std::fs::File::open(path).map_err(|e| ProviderError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl StatsProvider for CsvProvider {
    async fn fetch_raw_stats(&self) -> Result<StatTable, ProviderError> {
        let mut all_rows = Vec::new();
        for (season, path) in self.season_files()? {
            let file = self.open(&path)?;
            let rows = read_season_rows(file, season).map_err(|e| ProviderError::Csv {
                path: path.display().to_string(),
                source: e,
            })?;
            info!(season = %season, rows = rows.len(), file = %path.display(), "loaded season file");
            all_rows.extend(rows);
        }

        if all_rows.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(StatTable::new(all_rows)?)
    }

    async fn fetch_player_directory(&self) -> Result<HashMap<i64, String>, ProviderError> {
        let mut directory = HashMap::new();
        for (_, path) in self.season_files()? {
            let file = self.open(&path)?;
            let names = read_player_names(file).map_err(|e| ProviderError::Csv {
                path: path.display().to_string(),
                source: e,
            })?;
            directory.extend(names);
        }
        Ok(directory)
    }
}

// ---------------------------------------------------------------------------
// Scored export
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct ExportRow<'a> {
    PlayerID: i64,
    Season: SeasonToken,
    Team: Option<&'a str>,
    PlayerAge: Option<f64>,
    GamesPlayed: u32,
    AvgMinutes: Option<f64>,
    Points: f64,
    Rebounds: f64,
    Assists: f64,
    Steals: f64,
    Blocks: f64,
    Turnovers: f64,
    FieldGoalsMade: f64,
    FieldGoalAttempts: f64,
    FreeThrowsMade: f64,
    FreeThrowAttempts: f64,
    ThreePointersMade: f64,
    ThreePointAttempts: f64,
    FieldGoalPct: f64,
    FreeThrowPct: f64,
    ThreePointPct: f64,
    UsageRate: Option<f64>,
    TrueShootingPct: Option<f64>,
    VacatedUsage: Option<f64>,
    YearsInLeague: Option<u32>,
    PointsZScore: Option<f64>,
    ReboundsZScore: Option<f64>,
    AssistsZScore: Option<f64>,
    StealsZScore: Option<f64>,
    BlocksZScore: Option<f64>,
    TurnoversZScore: Option<f64>,
    ThreePointersMadeZScore: Option<f64>,
    FieldGoalPctZScore: Option<f64>,
    FreeThrowPctZScore: Option<f64>,
    SwishScore: Option<f64>,
    OverallRank: Option<u32>,
}

impl<'a> ExportRow<'a> {
    fn from_stat_row(row: &'a StatRow) -> Self {
        Self {
            PlayerID: row.player_id,
            Season: row.season,
            Team: row.team.as_deref(),
            PlayerAge: row.player_age,
            GamesPlayed: row.games_played,
            AvgMinutes: row.avg_minutes,
            Points: row.points,
            Rebounds: row.rebounds,
            Assists: row.assists,
            Steals: row.steals,
            Blocks: row.blocks,
            Turnovers: row.turnovers,
            FieldGoalsMade: row.field_goals_made,
            FieldGoalAttempts: row.field_goal_attempts,
            FreeThrowsMade: row.free_throws_made,
            FreeThrowAttempts: row.free_throw_attempts,
            ThreePointersMade: row.three_pointers_made,
            ThreePointAttempts: row.three_point_attempts,
            FieldGoalPct: row.field_goal_pct,
            FreeThrowPct: row.free_throw_pct,
            ThreePointPct: row.three_point_pct,
            UsageRate: row.usage_rate,
            TrueShootingPct: row.true_shooting_pct,
            VacatedUsage: row.vacated_usage,
            YearsInLeague: row.years_in_league,
            PointsZScore: row.points_z_score,
            ReboundsZScore: row.rebounds_z_score,
            AssistsZScore: row.assists_z_score,
            StealsZScore: row.steals_z_score,
            BlocksZScore: row.blocks_z_score,
            TurnoversZScore: row.turnovers_z_score,
            ThreePointersMadeZScore: row.three_pointers_made_z_score,
            FieldGoalPctZScore: row.field_goal_pct_z_score,
            FreeThrowPctZScore: row.free_throw_pct_z_score,
            SwishScore: row.swish_score,
            OverallRank: row.overall_rank,
        }
    }
}

/// Write one `<season>_combined_scores.csv` per season in the table.
/// Returns the written paths in season order.
pub fn export_season_tables(
    table: &StatTable,
    export_dir: &Path,
) -> Result<Vec<PathBuf>, ProviderError> {
    std::fs::create_dir_all(export_dir).map_err(|e| ProviderError::Io {
        path: export_dir.display().to_string(),
        source: e,
    })?;

    let mut written = Vec::new();
    for season in table.seasons() {
        let path = export_dir.join(format!("{season}_combined_scores.csv"));
        let mut writer = ::csv::Writer::from_path(&path).map_err(|e| ProviderError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;

        for row in table.rows().iter().filter(|r| r.season == season) {
            writer
                .serialize(ExportRow::from_stat_row(row))
                .map_err(|e| ProviderError::Csv {
                    path: path.display().to_string(),
                    source: e,
                })?;
        }
        writer.flush().map_err(|e| ProviderError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        written.push(path);
    }

    info!(files = written.len(), dir = %export_dir.display(), "exported scored season tables");
    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
