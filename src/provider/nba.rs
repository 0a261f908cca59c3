// HTTP client for the NBA stats provider.
//
// Fetches per-season league-wide player stats in two measures (Base and
// Advanced), merges them on player id, and filters by playing-time floors.
// The provider returns tabular JSON: named result sets with a `headers`
// array and a `rowSet` of value arrays, so columns are resolved by header
// name rather than position.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::ProviderConfig;
use crate::model::{SeasonToken, StatRow, StatTable};
use crate::provider::{ProviderError, StatsProvider};

const ENDPOINT: &str = "https://stats.nba.com/stats/leaguedashplayerstats";

// stats.nba.com rejects requests without browser-looking headers.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";
const REFERER: &str = "https://www.nba.com/";

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets")]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultSet {
    #[allow(dead_code)]
    name: String,
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// Header-name → column-index resolution for one result set.
struct Columns<'a> {
    headers: &'a [String],
}

impl<'a> Columns<'a> {
    fn new(headers: &'a [String]) -> Self {
        Self { headers }
    }

    fn index(&self, name: &str) -> Result<usize, ProviderError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ProviderError::Shape {
                endpoint: ENDPOINT.to_string(),
                message: format!("missing column `{name}`"),
            })
    }
}

fn f64_at(row: &[Value], idx: usize) -> Option<f64> {
    row.get(idx).and_then(Value::as_f64)
}

fn i64_at(row: &[Value], idx: usize) -> Option<i64> {
    row.get(idx).and_then(Value::as_i64)
}

fn str_at(row: &[Value], idx: usize) -> Option<&str> {
    row.get(idx).and_then(Value::as_str)
}

// ---------------------------------------------------------------------------
// Row parsing (free functions so they are testable without a client)
// ---------------------------------------------------------------------------

/// Parse a Base-measure result set into stat rows, dropping players below
/// the playing-time floors. Rows without a player id are skipped with a
/// warning; a missing column is a shape error for the whole set.
pub(crate) fn parse_base_rows(
    set: &ResultSet,
    season: SeasonToken,
    min_games_played: u32,
    min_avg_minutes: f64,
) -> Result<Vec<StatRow>, ProviderError> {
    let cols = Columns::new(&set.headers);
    let player_id = cols.index("PLAYER_ID")?;
    let team = cols.index("TEAM_ABBREVIATION")?;
    let age = cols.index("AGE")?;
    let gp = cols.index("GP")?;
    let min = cols.index("MIN")?;
    let pts = cols.index("PTS")?;
    let reb = cols.index("REB")?;
    let ast = cols.index("AST")?;
    let stl = cols.index("STL")?;
    let blk = cols.index("BLK")?;
    let tov = cols.index("TOV")?;
    let fgm = cols.index("FGM")?;
    let fga = cols.index("FGA")?;
    let ftm = cols.index("FTM")?;
    let fta = cols.index("FTA")?;
    let fg3m = cols.index("FG3M")?;
    let fg3a = cols.index("FG3A")?;
    let fg_pct = cols.index("FG_PCT")?;
    let ft_pct = cols.index("FT_PCT")?;
    let fg3_pct = cols.index("FG3_PCT")?;

    let mut rows = Vec::new();
    for raw in &set.row_set {
        let Some(id) = i64_at(raw, player_id) else {
            warn!(season = %season, "skipping row without a player id");
            continue;
        };

        let games = f64_at(raw, gp).unwrap_or(0.0).round() as u32;
        let minutes = f64_at(raw, min);
        if games < min_games_played || minutes.unwrap_or(0.0) < min_avg_minutes {
            continue;
        }

        let mut row = StatRow::new(id, season);
        row.team = str_at(raw, team).map(str::to_string);
        row.player_age = f64_at(raw, age);
        row.games_played = games;
        row.avg_minutes = minutes;
        row.points = f64_at(raw, pts).unwrap_or(0.0);
        row.rebounds = f64_at(raw, reb).unwrap_or(0.0);
        row.assists = f64_at(raw, ast).unwrap_or(0.0);
        row.steals = f64_at(raw, stl).unwrap_or(0.0);
        row.blocks = f64_at(raw, blk).unwrap_or(0.0);
        row.turnovers = f64_at(raw, tov).unwrap_or(0.0);
        row.field_goals_made = f64_at(raw, fgm).unwrap_or(0.0);
        row.field_goal_attempts = f64_at(raw, fga).unwrap_or(0.0);
        row.free_throws_made = f64_at(raw, ftm).unwrap_or(0.0);
        row.free_throw_attempts = f64_at(raw, fta).unwrap_or(0.0);
        row.three_pointers_made = f64_at(raw, fg3m).unwrap_or(0.0);
        row.three_point_attempts = f64_at(raw, fg3a).unwrap_or(0.0);
        row.field_goal_pct = f64_at(raw, fg_pct).unwrap_or(0.0);
        row.free_throw_pct = f64_at(raw, ft_pct).unwrap_or(0.0);
        row.three_point_pct = f64_at(raw, fg3_pct).unwrap_or(0.0);
        rows.push(row);
    }
    Ok(rows)
}

/// Parse an Advanced-measure result set into `player_id → (ts_pct,
/// usg_pct)`. Either value may be null for a player; the merge simply
/// leaves the optional field absent.
pub(crate) fn parse_advanced_rows(
    set: &ResultSet,
) -> Result<HashMap<i64, (Option<f64>, Option<f64>)>, ProviderError> {
    let cols = Columns::new(&set.headers);
    let player_id = cols.index("PLAYER_ID")?;
    let ts_pct = cols.index("TS_PCT")?;
    let usg_pct = cols.index("USG_PCT")?;

    let mut map = HashMap::with_capacity(set.row_set.len());
    for raw in &set.row_set {
        let Some(id) = i64_at(raw, player_id) else {
            continue;
        };
        map.insert(id, (f64_at(raw, ts_pct), f64_at(raw, usg_pct)));
    }
    Ok(map)
}

/// Parse player display names from a Base-measure result set.
pub(crate) fn parse_player_names(set: &ResultSet) -> Result<HashMap<i64, String>, ProviderError> {
    let cols = Columns::new(&set.headers);
    let player_id = cols.index("PLAYER_ID")?;
    let player_name = cols.index("PLAYER_NAME")?;

    let mut map = HashMap::with_capacity(set.row_set.len());
    for raw in &set.row_set {
        if let (Some(id), Some(name)) = (i64_at(raw, player_id), str_at(raw, player_name)) {
            map.insert(id, name.to_string());
        }
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async client for the NBA stats provider.
///
/// Fetches the configured window of seasons. A season that fails is logged
/// and skipped — partial data is still useful — but a wholly empty fetch
/// is surfaced as [`ProviderError::Empty`].
pub struct NbaStatsClient {
    http: reqwest::Client,
    seasons: Vec<SeasonToken>,
    min_games_played: u32,
    min_avg_minutes: f64,
    request_delay: Duration,
}

impl NbaStatsClient {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, ProviderError> {
        let current = cfg
            .current_start_year
            .unwrap_or_else(current_calendar_year);
        // The window ends with the season *before* the upcoming one, the
        // last season with complete stats.
        let first = current.saturating_sub(cfg.seasons_back);
        let seasons = (first..current).map(SeasonToken::from_start_year).collect();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Http {
                url: ENDPOINT.to_string(),
                source: e,
            })?;

        Ok(Self {
            http,
            seasons,
            min_games_played: cfg.min_games_played,
            min_avg_minutes: cfg.min_avg_minutes,
            request_delay: Duration::from_millis(cfg.request_delay_ms),
        })
    }

    pub fn seasons(&self) -> &[SeasonToken] {
        &self.seasons
    }

    async fn fetch_measure(
        &self,
        season: SeasonToken,
        measure: &str,
    ) -> Result<ResultSet, ProviderError> {
        let http_err = |e: reqwest::Error| ProviderError::Http {
            url: ENDPOINT.to_string(),
            source: e,
        };

        let response: StatsResponse = self
            .http
            .get(ENDPOINT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::REFERER, REFERER)
            .query(&[
                ("Season", season.to_string().as_str()),
                ("SeasonType", "Regular Season"),
                ("MeasureType", measure),
                ("PerMode", "PerGame"),
                ("LeagueID", "00"),
            ])
            .send()
            .await
            .map_err(http_err)?
            .error_for_status()
            .map_err(http_err)?
            .json()
            .await
            .map_err(http_err)?;

        response
            .result_sets
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Shape {
                endpoint: ENDPOINT.to_string(),
                message: "response contained no result sets".to_string(),
            })
    }

    /// Fetch Base and Advanced measures for one season and merge them.
    async fn fetch_season(&self, season: SeasonToken) -> Result<Vec<StatRow>, ProviderError> {
        let base = self.fetch_measure(season, "Base").await?;
        tokio::time::sleep(self.request_delay).await;
        let advanced = self.fetch_measure(season, "Advanced").await?;

        let mut rows =
            parse_base_rows(&base, season, self.min_games_played, self.min_avg_minutes)?;
        let advanced_by_id = parse_advanced_rows(&advanced)?;
        for row in &mut rows {
            if let Some((ts, usg)) = advanced_by_id.get(&row.player_id) {
                row.true_shooting_pct = *ts;
                row.usage_rate = *usg;
            }
        }
        Ok(rows)
    }
}

fn current_calendar_year() -> u16 {
    chrono::Local::now().year() as u16
}

#[async_trait]
impl StatsProvider for NbaStatsClient {
    async fn fetch_raw_stats(&self) -> Result<StatTable, ProviderError> {
        let mut all_rows = Vec::new();
        for (i, &season) in self.seasons.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.request_delay).await;
            }
            match self.fetch_season(season).await {
                Ok(rows) => {
                    info!(season = %season, rows = rows.len(), "fetched season stats");
                    all_rows.extend(rows);
                }
                Err(e) => {
                    error!(season = %season, "could not fetch season: {e}");
                }
            }
        }

        if all_rows.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(StatTable::new(all_rows)?)
    }

    async fn fetch_player_directory(&self) -> Result<HashMap<i64, String>, ProviderError> {
        let mut directory = HashMap::new();
        for (i, &season) in self.seasons.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.request_delay).await;
            }
            match self.fetch_measure(season, "Base").await {
                Ok(set) => directory.extend(parse_player_names(&set)?),
                Err(e) => {
                    error!(season = %season, "could not fetch player names: {e}");
                }
            }
        }

        if directory.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(directory)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_set(rows: Vec<Vec<Value>>) -> ResultSet {
        ResultSet {
            name: "LeagueDashPlayerStats".to_string(),
            headers: [
                "PLAYER_ID",
                "PLAYER_NAME",
                "TEAM_ABBREVIATION",
                "AGE",
                "GP",
                "MIN",
                "PTS",
                "REB",
                "AST",
                "STL",
                "BLK",
                "TOV",
                "FGM",
                "FGA",
                "FTM",
                "FTA",
                "FG3M",
                "FG3A",
                "FG_PCT",
                "FT_PCT",
                "FG3_PCT",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            row_set: rows,
        }
    }

    fn base_row(id: i64, name: &str, gp: f64, min: f64, pts: f64) -> Vec<Value> {
        vec![
            json!(id),
            json!(name),
            json!("BOS"),
            json!(26.0),
            json!(gp),
            json!(min),
            json!(pts),
            json!(7.5),
            json!(4.2),
            json!(1.1),
            json!(0.6),
            json!(2.3),
            json!(8.8),
            json!(17.4),
            json!(4.6),
            json!(5.3),
            json!(3.0),
            json!(8.1),
            json!(0.505),
            json!(0.868),
            json!(0.37),
        ]
    }

    fn season() -> SeasonToken {
        SeasonToken::from_start_year(2023)
    }

    #[test]
    fn base_rows_parsed_by_header_name() {
        let set = base_set(vec![base_row(1628369, "Jayson Tatum", 74.0, 35.7, 26.9)]);
        let rows = parse_base_rows(&set, season(), 20, 25.0).unwrap();

        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.player_id, 1628369);
        assert_eq!(r.season, season());
        assert_eq!(r.team.as_deref(), Some("BOS"));
        assert_eq!(r.games_played, 74);
        assert!((r.avg_minutes.unwrap() - 35.7).abs() < 1e-9);
        assert!((r.points - 26.9).abs() < 1e-9);
        assert!((r.field_goal_pct - 0.505).abs() < 1e-9);
        assert!(r.usage_rate.is_none());
    }

    #[test]
    fn playing_time_floors_applied() {
        let set = base_set(vec![
            base_row(1, "Regular", 70.0, 32.0, 20.0),
            base_row(2, "Few Games", 10.0, 32.0, 20.0),
            base_row(3, "Few Minutes", 70.0, 12.0, 20.0),
        ]);
        let rows = parse_base_rows(&set, season(), 20, 25.0).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player_id, 1);
    }

    #[test]
    fn row_without_player_id_skipped() {
        let mut bad = base_row(0, "Ghost", 70.0, 30.0, 10.0);
        bad[0] = Value::Null;
        let set = base_set(vec![bad, base_row(2, "Real", 70.0, 30.0, 10.0)]);
        let rows = parse_base_rows(&set, season(), 20, 25.0).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player_id, 2);
    }

    #[test]
    fn missing_column_is_shape_error() {
        let set = ResultSet {
            name: "LeagueDashPlayerStats".to_string(),
            headers: vec!["PLAYER_ID".to_string(), "GP".to_string()],
            row_set: vec![],
        };
        let err = parse_base_rows(&set, season(), 20, 25.0).unwrap_err();
        assert!(matches!(err, ProviderError::Shape { .. }));
    }

    #[test]
    fn advanced_rows_tolerate_nulls() {
        let set = ResultSet {
            name: "LeagueDashPlayerStats".to_string(),
            headers: vec![
                "PLAYER_ID".to_string(),
                "TS_PCT".to_string(),
                "USG_PCT".to_string(),
            ],
            row_set: vec![
                vec![json!(1), json!(0.61), json!(0.29)],
                vec![json!(2), Value::Null, json!(0.22)],
            ],
        };
        let map = parse_advanced_rows(&set).unwrap();

        assert_eq!(map[&1], (Some(0.61), Some(0.29)));
        assert_eq!(map[&2], (None, Some(0.22)));
    }

    #[test]
    fn player_names_extracted() {
        let set = base_set(vec![
            base_row(1, "Jayson Tatum", 74.0, 35.7, 26.9),
            base_row(2, "Jaylen Brown", 70.0, 33.5, 23.0),
        ]);
        let names = parse_player_names(&set).unwrap();

        assert_eq!(names[&1], "Jayson Tatum");
        assert_eq!(names[&2], "Jaylen Brown");
    }

    #[test]
    fn season_window_ends_before_current_year() {
        let cfg = ProviderConfig {
            current_start_year: Some(2025),
            seasons_back: 3,
            ..ProviderConfig::default()
        };
        let client = NbaStatsClient::from_config(&cfg).unwrap();
        let years: Vec<u16> = client.seasons().iter().map(|s| s.start_year()).collect();
        assert_eq!(years, vec![2022, 2023, 2024]);
    }

    #[test]
    fn stats_response_deserializes_result_sets() {
        let body = json!({
            "resource": "leaguedashplayerstats",
            "resultSets": [{
                "name": "LeagueDashPlayerStats",
                "headers": ["PLAYER_ID", "TS_PCT", "USG_PCT"],
                "rowSet": [[1, 0.6, 0.3]]
            }]
        });
        let parsed: StatsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.result_sets.len(), 1);
        assert_eq!(parsed.result_sets[0].row_set.len(), 1);
    }
}
