// Raw stat acquisition: the collaborators that hand the core its input.

pub mod csv;
pub mod nba;

pub use csv::CsvProvider;
pub use nba::NbaStatsClient;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{StatTable, TableError};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        source: ::csv::Error,
    },

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("unexpected response shape from {endpoint}: {message}")]
    Shape { endpoint: String, message: String },

    #[error("provider produced no rows")]
    Empty,

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Source of raw player-season stats.
///
/// Implementations may be partial (a failed season is logged and skipped),
/// but a wholly empty result is an error — the pipeline never fabricates
/// output for an absent dataset. The player directory is display-only and
/// never feeds a computation.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_raw_stats(&self) -> Result<StatTable, ProviderError>;

    async fn fetch_player_directory(&self) -> Result<HashMap<i64, String>, ProviderError>;
}
