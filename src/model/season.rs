// Season token: structured representation of an NBA season label.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A season identified by its starting calendar year, displayed as
/// `YYYY-YY` (e.g. `2023-24` for the season starting in 2023).
///
/// Seasons are totally ordered by start year. The string form is parsed
/// exactly once at the ingestion boundary; everything downstream works
/// with this value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeasonToken {
    start_year: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeasonParseError {
    #[error("season `{0}` is not in YYYY-YY format")]
    Malformed(String),

    #[error("season `{input}` has suffix {suffix:02} but start year {start_year} implies {expected:02}")]
    SuffixMismatch {
        input: String,
        start_year: u16,
        suffix: u8,
        expected: u8,
    },
}

impl SeasonToken {
    pub fn from_start_year(start_year: u16) -> Self {
        Self { start_year }
    }

    /// The calendar year the season starts in.
    pub fn start_year(&self) -> u16 {
        self.start_year
    }

    /// The season one year later (`2023-24` → `2024-25`).
    pub fn next(&self) -> Self {
        Self {
            start_year: self.start_year + 1,
        }
    }

    /// The season one year earlier, or `None` at the representable floor.
    pub fn prev(&self) -> Option<Self> {
        self.start_year.checked_sub(1).map(|y| Self { start_year: y })
    }
}

impl fmt::Display for SeasonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, (self.start_year + 1) % 100)
    }
}

impl FromStr for SeasonToken {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SeasonParseError::Malformed(s.to_string());

        let (year_part, suffix_part) = s.split_once('-').ok_or_else(malformed)?;
        if year_part.len() != 4 || suffix_part.len() != 2 {
            return Err(malformed());
        }
        let start_year: u16 = year_part.parse().map_err(|_| malformed())?;
        let suffix: u8 = suffix_part.parse().map_err(|_| malformed())?;

        let expected = ((start_year + 1) % 100) as u8;
        if suffix != expected {
            return Err(SeasonParseError::SuffixMismatch {
                input: s.to_string(),
                start_year,
                suffix,
                expected,
            });
        }

        Ok(Self { start_year })
    }
}

impl Serialize for SeasonToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SeasonToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_digit_suffix() {
        assert_eq!(SeasonToken::from_start_year(2023).to_string(), "2023-24");
        assert_eq!(SeasonToken::from_start_year(2015).to_string(), "2015-16");
    }

    #[test]
    fn display_handles_century_rollover() {
        assert_eq!(SeasonToken::from_start_year(1999).to_string(), "1999-00");
        assert_eq!(SeasonToken::from_start_year(2099).to_string(), "2099-00");
    }

    #[test]
    fn parse_roundtrip() {
        let s: SeasonToken = "2021-22".parse().unwrap();
        assert_eq!(s.start_year(), 2021);
        assert_eq!(s.to_string(), "2021-22");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("garbage".parse::<SeasonToken>().is_err());
        assert!("2021".parse::<SeasonToken>().is_err());
        assert!("21-22".parse::<SeasonToken>().is_err());
        assert!("2021-2022".parse::<SeasonToken>().is_err());
        assert!("".parse::<SeasonToken>().is_err());
    }

    #[test]
    fn parse_rejects_mismatched_suffix() {
        let err = "2021-23".parse::<SeasonToken>().unwrap_err();
        match err {
            SeasonParseError::SuffixMismatch {
                start_year,
                suffix,
                expected,
                ..
            } => {
                assert_eq!(start_year, 2021);
                assert_eq!(suffix, 23);
                assert_eq!(expected, 22);
            }
            other => panic!("expected SuffixMismatch, got: {other}"),
        }
    }

    #[test]
    fn next_and_prev() {
        let s = SeasonToken::from_start_year(2021);
        assert_eq!(s.next(), SeasonToken::from_start_year(2022));
        assert_eq!(s.prev(), Some(SeasonToken::from_start_year(2020)));
        assert_eq!(s.next().to_string(), "2022-23");
    }

    #[test]
    fn ordering_follows_start_year() {
        let a = SeasonToken::from_start_year(2019);
        let b = SeasonToken::from_start_year(2020);
        assert!(a < b);
        assert!(b > a);
        assert_eq!(a, "2019-20".parse().unwrap());
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let s = SeasonToken::from_start_year(2022);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"2022-23\"");
        let back: SeasonToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn serde_rejects_invalid_string() {
        assert!(serde_json::from_str::<SeasonToken>("\"2022-99\"").is_err());
    }
}
