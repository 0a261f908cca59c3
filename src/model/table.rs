// StatTable: ordered, uniquely-keyed collection of player-season rows.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::row::StatRow;
use crate::model::season::SeasonToken;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("duplicate row for player {player_id}, season {season}")]
    DuplicateKey {
        player_id: i64,
        season: SeasonToken,
    },
}

/// An ordered collection of [`StatRow`] uniquely keyed by
/// `(player_id, season)`.
///
/// Construction normalizes row order to `(player_id, season.start_year)`,
/// so a player's rows are always contiguous and chronologically sorted —
/// the invariant every temporal stage relies on. Stages consume a table by
/// value and return a new one; none of them reorders rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    rows: Vec<StatRow>,
}

impl StatTable {
    /// Build a table from rows in any order. Rejects duplicate
    /// `(player_id, season)` keys.
    pub fn new(mut rows: Vec<StatRow>) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert((row.player_id, row.season)) {
                return Err(TableError::DuplicateKey {
                    player_id: row.player_id,
                    season: row.season,
                });
            }
        }
        rows.sort_by_key(|r| (r.player_id, r.season));
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<StatRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct seasons present in the table, ascending.
    pub fn seasons(&self) -> Vec<SeasonToken> {
        let mut seasons: Vec<SeasonToken> = self
            .rows
            .iter()
            .map(|r| r.season)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        seasons.sort();
        seasons
    }

    /// Immutable per-player groups, in table order. Relies on the
    /// construction-time sort keeping each player's rows contiguous.
    pub fn player_groups(&self) -> impl Iterator<Item = &[StatRow]> {
        self.rows.chunk_by(|a, b| a.player_id == b.player_id)
    }

    /// Mutable per-player groups, in table order.
    pub(crate) fn player_groups_mut(&mut self) -> impl Iterator<Item = &mut [StatRow]> {
        self.rows.chunk_by_mut(|a, b| a.player_id == b.player_id)
    }

    /// Mutable access for stages that fill derived columns in place.
    pub(crate) fn rows_mut(&mut self) -> &mut [StatRow] {
        &mut self.rows
    }

    /// Drop rows not matching the predicate, preserving relative order.
    pub(crate) fn retain<F: FnMut(&StatRow) -> bool>(&mut self, f: F) {
        self.rows.retain(f);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
