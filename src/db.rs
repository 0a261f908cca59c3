// SQLite persistence for players and engineered season stats.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::model::{SeasonToken, StatRow, StatTable};

/// SQLite-backed persistence for the player directory and the fully
/// engineered stat table.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                player_id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS player_stats_by_season (
                player_id                       INTEGER NOT NULL,
                season                          TEXT NOT NULL,
                team                            TEXT,
                player_age                      REAL,
                games_played                    INTEGER NOT NULL,
                avg_minutes                     REAL,
                points                          REAL NOT NULL,
                rebounds                        REAL NOT NULL,
                assists                         REAL NOT NULL,
                steals                          REAL NOT NULL,
                blocks                          REAL NOT NULL,
                turnovers                       REAL NOT NULL,
                field_goals_made                REAL NOT NULL,
                field_goal_attempts             REAL NOT NULL,
                free_throws_made                REAL NOT NULL,
                free_throw_attempts             REAL NOT NULL,
                three_pointers_made             REAL NOT NULL,
                three_point_attempts            REAL NOT NULL,
                field_goal_pct                  REAL NOT NULL,
                free_throw_pct                  REAL NOT NULL,
                three_point_pct                 REAL NOT NULL,
                usage_rate                      REAL,
                true_shooting_pct               REAL,
                points_per_36_min               REAL,
                rebounds_per_36_min             REAL,
                assists_per_36_min              REAL,
                steals_per_36_min               REAL,
                blocks_per_36_min               REAL,
                turnovers_per_36_min            REAL,
                three_pointers_made_per_36_min  REAL,
                points_yoy_diff                 REAL,
                rebounds_yoy_diff               REAL,
                assists_yoy_diff                REAL,
                steals_yoy_diff                 REAL,
                blocks_yoy_diff                 REAL,
                turnovers_yoy_diff              REAL,
                three_pointers_made_yoy_diff    REAL,
                swish_score_yoy_diff            REAL,
                usage_rate_yoy_diff             REAL,
                true_shooting_pct_yoy_diff      REAL,
                player_age_sq                   REAL,
                years_in_league                 INTEGER,
                vacated_usage                   REAL,
                points_z_score                  REAL,
                rebounds_z_score                REAL,
                assists_z_score                 REAL,
                steals_z_score                  REAL,
                blocks_z_score                  REAL,
                turnovers_z_score               REAL,
                three_pointers_made_z_score     REAL,
                field_goal_pct_z_score          REAL,
                free_throw_pct_z_score          REAL,
                swish_score                     REAL,
                overall_rank                    INTEGER,
                PRIMARY KEY (player_id, season)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Upsert the player directory. Existing names are overwritten.
    pub fn upsert_players(&self, directory: &HashMap<i64, String>) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        {
            let mut stmt = tx
                .prepare("INSERT OR REPLACE INTO players (player_id, full_name) VALUES (?1, ?2)")
                .context("failed to prepare players upsert")?;
            for (player_id, name) in directory {
                stmt.execute(params![player_id, name])
                    .context("failed to upsert player")?;
            }
        }
        tx.commit().context("failed to commit players upsert")?;
        Ok(directory.len())
    }

    /// Load the player directory as `player_id → full_name`.
    pub fn load_player_directory(&self) -> Result<HashMap<i64, String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT player_id, full_name FROM players")
            .context("failed to prepare players query")?;
        let map = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .context("failed to query players")?
            .collect::<rusqlite::Result<HashMap<i64, String>>>()
            .context("failed to read player rows")?;
        Ok(map)
    }

    /// Upsert every row of a stat table, keyed on `(player_id, season)`.
    /// The whole row is replaced, so re-running the pipeline refreshes
    /// previously persisted derived columns.
    pub fn upsert_rows(&self, table: &StatTable) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO player_stats_by_season (
                        player_id, season, team, player_age, games_played, avg_minutes,
                        points, rebounds, assists, steals, blocks, turnovers,
                        field_goals_made, field_goal_attempts, free_throws_made,
                        free_throw_attempts, three_pointers_made, three_point_attempts,
                        field_goal_pct, free_throw_pct, three_point_pct,
                        usage_rate, true_shooting_pct,
                        points_per_36_min, rebounds_per_36_min, assists_per_36_min,
                        steals_per_36_min, blocks_per_36_min, turnovers_per_36_min,
                        three_pointers_made_per_36_min,
                        points_yoy_diff, rebounds_yoy_diff, assists_yoy_diff,
                        steals_yoy_diff, blocks_yoy_diff, turnovers_yoy_diff,
                        three_pointers_made_yoy_diff, swish_score_yoy_diff,
                        usage_rate_yoy_diff, true_shooting_pct_yoy_diff,
                        player_age_sq, years_in_league, vacated_usage,
                        points_z_score, rebounds_z_score, assists_z_score,
                        steals_z_score, blocks_z_score, turnovers_z_score,
                        three_pointers_made_z_score, field_goal_pct_z_score,
                        free_throw_pct_z_score, swish_score, overall_rank
                    ) VALUES (
                        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                        ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                        ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38,
                        ?39, ?40, ?41, ?42, ?43, ?44, ?45, ?46, ?47, ?48, ?49, ?50,
                        ?51, ?52, ?53, ?54
                    )",
                )
                .context("failed to prepare stats upsert")?;

            for row in table.rows() {
                stmt.execute(params![
                    row.player_id,
                    row.season.to_string(),
                    row.team,
                    row.player_age,
                    row.games_played,
                    row.avg_minutes,
                    row.points,
                    row.rebounds,
                    row.assists,
                    row.steals,
                    row.blocks,
                    row.turnovers,
                    row.field_goals_made,
                    row.field_goal_attempts,
                    row.free_throws_made,
                    row.free_throw_attempts,
                    row.three_pointers_made,
                    row.three_point_attempts,
                    row.field_goal_pct,
                    row.free_throw_pct,
                    row.three_point_pct,
                    row.usage_rate,
                    row.true_shooting_pct,
                    row.points_per_36_min,
                    row.rebounds_per_36_min,
                    row.assists_per_36_min,
                    row.steals_per_36_min,
                    row.blocks_per_36_min,
                    row.turnovers_per_36_min,
                    row.three_pointers_made_per_36_min,
                    row.points_yoy_diff,
                    row.rebounds_yoy_diff,
                    row.assists_yoy_diff,
                    row.steals_yoy_diff,
                    row.blocks_yoy_diff,
                    row.turnovers_yoy_diff,
                    row.three_pointers_made_yoy_diff,
                    row.swish_score_yoy_diff,
                    row.usage_rate_yoy_diff,
                    row.true_shooting_pct_yoy_diff,
                    row.player_age_sq,
                    row.years_in_league,
                    row.vacated_usage,
                    row.points_z_score,
                    row.rebounds_z_score,
                    row.assists_z_score,
                    row.steals_z_score,
                    row.blocks_z_score,
                    row.turnovers_z_score,
                    row.three_pointers_made_z_score,
                    row.field_goal_pct_z_score,
                    row.free_throw_pct_z_score,
                    row.swish_score,
                    row.overall_rank,
                ])
                .context("failed to upsert stat row")?;
            }
        }
        tx.commit().context("failed to commit stats upsert")?;
        Ok(table.len())
    }

    /// Load every persisted stat row back into a table.
    pub fn load_table(&self) -> Result<StatTable> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT * FROM player_stats_by_season")
            .context("failed to prepare stats query")?;

        let rows = stmt
            .query_map([], |row| {
                let season_text: String = row.get("season")?;
                let season: SeasonToken = season_text.parse().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;

                let mut r = StatRow::new(row.get("player_id")?, season);
                r.team = row.get("team")?;
                r.player_age = row.get("player_age")?;
                r.games_played = row.get("games_played")?;
                r.avg_minutes = row.get("avg_minutes")?;
                r.points = row.get("points")?;
                r.rebounds = row.get("rebounds")?;
                r.assists = row.get("assists")?;
                r.steals = row.get("steals")?;
                r.blocks = row.get("blocks")?;
                r.turnovers = row.get("turnovers")?;
                r.field_goals_made = row.get("field_goals_made")?;
                r.field_goal_attempts = row.get("field_goal_attempts")?;
                r.free_throws_made = row.get("free_throws_made")?;
                r.free_throw_attempts = row.get("free_throw_attempts")?;
                r.three_pointers_made = row.get("three_pointers_made")?;
                r.three_point_attempts = row.get("three_point_attempts")?;
                r.field_goal_pct = row.get("field_goal_pct")?;
                r.free_throw_pct = row.get("free_throw_pct")?;
                r.three_point_pct = row.get("three_point_pct")?;
                r.usage_rate = row.get("usage_rate")?;
                r.true_shooting_pct = row.get("true_shooting_pct")?;
                r.points_per_36_min = row.get("points_per_36_min")?;
                r.rebounds_per_36_min = row.get("rebounds_per_36_min")?;
                r.assists_per_36_min = row.get("assists_per_36_min")?;
                r.steals_per_36_min = row.get("steals_per_36_min")?;
                r.blocks_per_36_min = row.get("blocks_per_36_min")?;
                r.turnovers_per_36_min = row.get("turnovers_per_36_min")?;
                r.three_pointers_made_per_36_min = row.get("three_pointers_made_per_36_min")?;
                r.points_yoy_diff = row.get("points_yoy_diff")?;
                r.rebounds_yoy_diff = row.get("rebounds_yoy_diff")?;
                r.assists_yoy_diff = row.get("assists_yoy_diff")?;
                r.steals_yoy_diff = row.get("steals_yoy_diff")?;
                r.blocks_yoy_diff = row.get("blocks_yoy_diff")?;
                r.turnovers_yoy_diff = row.get("turnovers_yoy_diff")?;
                r.three_pointers_made_yoy_diff = row.get("three_pointers_made_yoy_diff")?;
                r.swish_score_yoy_diff = row.get("swish_score_yoy_diff")?;
                r.usage_rate_yoy_diff = row.get("usage_rate_yoy_diff")?;
                r.true_shooting_pct_yoy_diff = row.get("true_shooting_pct_yoy_diff")?;
                r.player_age_sq = row.get("player_age_sq")?;
                r.years_in_league = row.get("years_in_league")?;
                r.vacated_usage = row.get("vacated_usage")?;
                r.points_z_score = row.get("points_z_score")?;
                r.rebounds_z_score = row.get("rebounds_z_score")?;
                r.assists_z_score = row.get("assists_z_score")?;
                r.steals_z_score = row.get("steals_z_score")?;
                r.blocks_z_score = row.get("blocks_z_score")?;
                r.turnovers_z_score = row.get("turnovers_z_score")?;
                r.three_pointers_made_z_score = row.get("three_pointers_made_z_score")?;
                r.field_goal_pct_z_score = row.get("field_goal_pct_z_score")?;
                r.free_throw_pct_z_score = row.get("free_throw_pct_z_score")?;
                r.swish_score = row.get("swish_score")?;
                r.overall_rank = row.get("overall_rank")?;
                Ok(r)
            })
            .context("failed to query stat rows")?
            .collect::<rusqlite::Result<Vec<StatRow>>>()
            .context("failed to read stat rows")?;

        StatTable::new(rows).context("persisted rows violate table invariants")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
