// Feature-engineering stages: per-minute rates, year-over-year deltas,
// age/experience curves, team-context attribution.

pub mod experience;
pub mod per_minute;
pub mod team_context;
pub mod temporal;

pub use experience::ExperienceAnnotator;
pub use per_minute::PerMinuteNormalizer;
pub use team_context::TeamContextAttributor;
pub use temporal::TemporalDiffer;

use thiserror::Error;

/// Errors surfaced by pipeline stages.
///
/// Only a wholly empty input is fatal; missing columns, degenerate cohorts,
/// and unresolvable joins all degrade gracefully inside the stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage}: input table is empty")]
    EmptyInput { stage: &'static str },
}
