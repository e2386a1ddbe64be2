//! Calendar quarters used as the period axis for cash-flow series
//!
//! Quarters render and parse as `Qn YYYY` (e.g. `Q3 2024`). The label is the
//! join key when historical and projected series are stitched together.

use crate::error::{EngineError, Result};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Years accepted for quarter labels
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=9999;

/// A calendar quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Create a quarter, `quarter` must be in 1..=4 and `year` in [`YEAR_RANGE`]
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) || !YEAR_RANGE.contains(&year) {
            return Err(EngineError::InvalidQuarter(format!("Q{} {}", quarter, year)));
        }
        Ok(Self { year, quarter })
    }

    /// Quarter containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }

    /// Current calendar quarter (UTC)
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// The following quarter
    pub fn next(&self) -> Self {
        self.succ_n(1)
    }

    /// The quarter `n` steps after this one
    pub fn succ_n(&self, n: u32) -> Self {
        let index = self.ordinal() + n as i64;
        Self::from_ordinal(index)
    }

    /// Number of quarters from `self` to `other` (negative if `other` is earlier)
    pub fn quarters_until(&self, other: &Quarter) -> i64 {
        other.ordinal() - self.ordinal()
    }

    fn ordinal(&self) -> i64 {
        self.year as i64 * 4 + (self.quarter as i64 - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        let year = ordinal.div_euclid(4).clamp(i32::MIN as i64, i32::MAX as i64);
        Self {
            year: year as i32,
            quarter: (ordinal.rem_euclid(4) + 1) as u8,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

impl FromStr for Quarter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidQuarter(s.to_string());
        let mut parts = s.split_whitespace();
        let q = parts.next().ok_or_else(invalid)?;
        let year = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let quarter = q
            .strip_prefix('Q')
            .or_else(|| q.strip_prefix('q'))
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;

        Quarter::new(year, quarter).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Quarter {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Quarter> for String {
    fn from(q: Quarter) -> Self {
        q.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        let q: Quarter = "Q3 2024".parse().unwrap();
        assert_eq!(q.year(), 2024);
        assert_eq!(q.quarter(), 3);
        assert_eq!(q.to_string(), "Q3 2024");
    }

    #[test]
    fn test_next_wraps_year() {
        let q = Quarter::new(2023, 4).unwrap();
        assert_eq!(q.next().to_string(), "Q1 2024");
        assert_eq!(q.succ_n(5).to_string(), "Q1 2025");
    }

    #[test]
    fn test_from_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(Quarter::from_date(date).to_string(), "Q2 2024");

        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(Quarter::from_date(date).to_string(), "Q4 2024");
    }

    #[test]
    fn test_ordering_and_distance() {
        let a = Quarter::new(2023, 3).unwrap();
        let b = Quarter::new(2024, 2).unwrap();
        assert!(a < b);
        assert_eq!(a.quarters_until(&b), 3);
        assert_eq!(b.quarters_until(&a), -3);
    }

    #[test]
    fn test_invalid_labels() {
        assert!("Q5 2024".parse::<Quarter>().is_err());
        assert!("2024 Q1".parse::<Quarter>().is_err());
        assert!("Q1".parse::<Quarter>().is_err());
        assert!("Q1 2024 extra".parse::<Quarter>().is_err());
        assert!(Quarter::new(2024, 0).is_err());
    }

    #[test]
    fn test_year_out_of_range() {
        assert!(matches!(
            "Q1 -2000000000".parse::<Quarter>(),
            Err(EngineError::InvalidQuarter(_))
        ));
        assert!("Q1 2000000000".parse::<Quarter>().is_err());
        assert!(Quarter::new(1899, 4).is_err());
        assert!(Quarter::new(10000, 1).is_err());
        assert!(Quarter::new(1900, 1).is_ok());
        assert!(Quarter::new(9999, 4).is_ok());
    }

    #[test]
    fn test_serde_as_label() {
        let q = Quarter::new(2025, 1).unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, "\"Q1 2025\"");

        let parsed: Quarter = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, q);
        assert!(serde_json::from_str::<Quarter>("\"Q9 2025\"").is_err());
    }
}
