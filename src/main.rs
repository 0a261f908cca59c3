// Swish pipeline entry point.
//
// Run sequence:
// 1. Initialize tracing (stderr; stdout carries the report)
// 2. Load config
// 3. Build the configured stats provider (http or csv)
// 4. Fetch raw season stats and the player directory
// 5. Run the feature-engineering and scoring pipeline
// 6. Upsert players and scored rows into SQLite
// 7. Export per-season scored CSVs
// 8. Print the top-N ranking report

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use swish_pipeline::config::{self, ProviderSource};
use swish_pipeline::db::Database;
use swish_pipeline::pipeline;
use swish_pipeline::provider::{self, CsvProvider, NbaStatsClient, StatsProvider};
use swish_pipeline::report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("swish pipeline starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} weighted stats, rank method {:?}",
        config.weights.len(),
        config.scoring.rank_method
    );

    // 3. Build the configured provider
    let provider: Box<dyn StatsProvider> = match config.provider.source {
        ProviderSource::Http => Box::new(
            NbaStatsClient::from_config(&config.provider)
                .context("failed to build stats client")?,
        ),
        ProviderSource::Csv => Box::new(CsvProvider::new(&config.data.season_dir)),
    };

    // 4. Fetch raw stats; the display-only directory is allowed to fail
    let raw = provider
        .fetch_raw_stats()
        .await
        .context("failed to fetch raw season stats")?;
    info!(rows = raw.len(), seasons = raw.seasons().len(), "raw stats fetched");

    let directory = match provider.fetch_player_directory().await {
        Ok(directory) => directory,
        Err(e) => {
            warn!("player directory unavailable, report will show ids: {e}");
            HashMap::new()
        }
    };

    // 5. Run the pipeline
    let scored = pipeline::run(raw, &config).context("pipeline failed")?;

    // 6. Persist
    let db = Database::open(&config.database.path).context("failed to open database")?;
    let players = db.upsert_players(&directory)?;
    let rows = db.upsert_rows(&scored)?;
    info!(players, rows, db = %config.database.path, "persisted scored table");

    // 7. Export per-season CSVs
    let written =
        provider::csv::export_season_tables(&scored, Path::new(&config.data.export_dir))
            .context("failed to export scored season tables")?;
    info!(files = written.len(), "scored season tables exported");

    // 8. Report
    print!(
        "{}",
        report::format_top_n(&scored, &directory, config.report.top_n)
    );

    info!("swish pipeline finished");
    Ok(())
}

/// Initialize tracing to stderr, leaving stdout to the ranking report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("swish_pipeline=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
