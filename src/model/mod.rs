// Core data model: seasons, rows, tables, stat keys.

pub mod row;
pub mod season;
pub mod table;

pub use row::{StatKey, StatRow};
pub use season::{SeasonParseError, SeasonToken};
pub use table::{StatTable, TableError};
