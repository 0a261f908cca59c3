// Configuration loading and parsing (config/pipeline.toml).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::model::StatKey;
use crate::scoring::RankMethod;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

/// Fully assembled pipeline configuration. Every section has built-in
/// defaults matching the reference weight table and stat sets, so a
/// missing or partial `pipeline.toml` degrades to known-good values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stats: StatSets,
    pub weights: BTreeMap<StatKey, f64>,
    pub scoring: ScoringConfig,
    pub provider: ProviderConfig,
    pub database: DatabaseConfig,
    pub data: DataPaths,
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stats: StatSets::default(),
            weights: default_weights(),
            scoring: ScoringConfig::default(),
            provider: ProviderConfig::default(),
            database: DatabaseConfig::default(),
            data: DataPaths::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Which stats each stage operates on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatSets {
    pub per_minute: Vec<StatKey>,
    pub yoy_diff: Vec<StatKey>,
    pub z_score: Vec<StatKey>,
}

impl Default for StatSets {
    fn default() -> Self {
        use StatKey::*;
        Self {
            per_minute: vec![
                Points,
                Rebounds,
                Assists,
                Steals,
                Blocks,
                Turnovers,
                ThreePointersMade,
            ],
            yoy_diff: vec![
                Points,
                Rebounds,
                Assists,
                Steals,
                Blocks,
                Turnovers,
                ThreePointersMade,
                SwishScore,
                UsageRate,
                TrueShootingPct,
            ],
            z_score: vec![
                Points,
                Rebounds,
                Assists,
                Steals,
                Blocks,
                FieldGoalPct,
                ThreePointersMade,
                FreeThrowPct,
                Turnovers,
            ],
        }
    }
}

/// Signed per-category multipliers for the composite score. Turnovers stay
/// negative: they are a penalty.
fn default_weights() -> BTreeMap<StatKey, f64> {
    let mut w = BTreeMap::new();
    w.insert(StatKey::Points, 1.195);
    w.insert(StatKey::Rebounds, 1.267);
    w.insert(StatKey::Assists, 1.239);
    w.insert(StatKey::Steals, 1.322);
    w.insert(StatKey::Blocks, 1.426);
    w.insert(StatKey::FieldGoalPct, 1.380);
    w.insert(StatKey::ThreePointersMade, 1.286);
    w.insert(StatKey::FreeThrowPct, 1.256);
    w.insert(StatKey::Turnovers, -1.217);
    w
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub rank_method: RankMethod,
}

/// Where raw season stats come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSource {
    Http,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub source: ProviderSource,
    /// Start year of the most recent season to fetch. When omitted it is
    /// derived from the current date at startup.
    pub current_start_year: Option<u16>,
    /// How many seasons back from the current one to fetch.
    pub seasons_back: u16,
    /// Rows below these playing-time floors are dropped at ingestion.
    pub min_games_played: u32,
    pub min_avg_minutes: f64,
    pub request_timeout_secs: u64,
    /// Pause between provider requests, to stay polite with the API.
    pub request_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            source: ProviderSource::Http,
            current_start_year: None,
            seasons_back: 10,
            min_games_played: 20,
            min_avg_minutes: 25.0,
            request_timeout_secs: 30,
            request_delay_ms: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "swish.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Directory holding `nba_stats_<YYYY-YY>.csv` season files.
    pub season_dir: String,
    /// Directory scored per-season CSVs are written to.
    pub export_dir: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            season_dir: "data".to_string(),
            export_dir: "data/scored".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: 20 }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Parse a configuration document. Missing sections and fields fall back
/// to defaults; the result is validated before being returned.
pub(crate) fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from `config/pipeline.toml` under `base_dir`.
///
/// A missing file is not an error: the built-in defaults are used and the
/// fallback is logged.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("pipeline.toml");
    if !path.exists() {
        info!(path = %path.display(), "config file not found; using built-in defaults");
        return Ok(Config::default());
    }

    let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
        path: path.clone(),
        source: e,
    })?;
    parse_config(&text, &path)
}

/// Convenience wrapper: loads config relative to the current working
/// directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
        path: PathBuf::from("."),
        source: e,
    })?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.stats.per_minute.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "stats.per_minute".into(),
            message: "must list at least one stat".into(),
        });
    }
    if config.stats.yoy_diff.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "stats.yoy_diff".into(),
            message: "must list at least one stat".into(),
        });
    }
    if config.stats.z_score.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "stats.z_score".into(),
            message: "must list at least one stat".into(),
        });
    }

    if config.weights.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "weights".into(),
            message: "must map at least one stat to a coefficient".into(),
        });
    }
    for (stat, weight) in &config.weights {
        if !weight.is_finite() || *weight == 0.0 {
            return Err(ConfigError::ValidationError {
                field: format!("weights.{}", stat.name()),
                message: format!("must be finite and non-zero, got {weight}"),
            });
        }
    }

    let p = &config.provider;
    if p.seasons_back == 0 {
        return Err(ConfigError::ValidationError {
            field: "provider.seasons_back".into(),
            message: "must be greater than 0".into(),
        });
    }
    if !p.min_avg_minutes.is_finite() || p.min_avg_minutes < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "provider.min_avg_minutes".into(),
            message: format!("must be finite and >= 0, got {}", p.min_avg_minutes),
        });
    }
    if p.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "provider.request_timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.report.top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "report.top_n".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
