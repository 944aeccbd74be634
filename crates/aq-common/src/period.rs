//! Period keys matching station observations to a displayed month.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AqError, AqResult};

/// A (year, month) pair, formatted as "YYYY-MM" in station properties and
/// file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: u16,
    pub month: u8,
}

impl PeriodKey {
    /// Create a period key, validating that the month names a real calendar
    /// month.
    pub fn new(year: u16, month: u8) -> AqResult<Self> {
        if NaiveDate::from_ymd_opt(year as i32, month as u32, 1).is_none() {
            return Err(AqError::InvalidPeriod(format!("{}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Parse a "YYYY-MM" string.
    pub fn parse(s: &str) -> AqResult<Self> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| AqError::InvalidPeriod(s.to_string()))?;
        let year: u16 = year
            .parse()
            .map_err(|_| AqError::InvalidPeriod(s.to_string()))?;
        let month: u8 = month
            .parse()
            .map_err(|_| AqError::InvalidPeriod(s.to_string()))?;
        Self::new(year, month)
    }

    /// Zero-padded month as used in file names ("01".."12").
    pub fn month_token(&self) -> String {
        format!("{:02}", self.month)
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
