// Scoring stages: z-score standardization and composite weighted scoring.

pub mod composite;
pub mod zscore;

pub use composite::{CompositeScorer, RankMethod};
pub use zscore::{cohort_stats, z_score, CohortStats, ZScoreStandardizer};
