use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PaymentsError, Result};

/// A calendar month in which an installment falls due.
///
/// Ordering is chronological: year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    /// Calendar year.
    pub year: i32,
    /// Month of the year, 1 for January through 12 for December.
    pub month: u32,
}

impl BillingMonth {
    /// Builds a month, rejecting anything outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(PaymentsError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given instant (UTC).
    pub fn of(instant: &DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    /// Moves forward `months` months.
    pub fn offset(self, months: u32) -> Self {
        let zero_based = self.year as i64 * 12 + (self.month as i64 - 1) + months as i64;
        Self {
            year: zero_based.div_euclid(12) as i32,
            month: zero_based.rem_euclid(12) as u32 + 1,
        }
    }

    /// True once this month has fully elapsed at `as_of`.
    pub fn has_elapsed(self, as_of: &DateTime<Utc>) -> bool {
        self < Self::of(as_of)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of billing months used by administrative overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    /// First month included.
    pub first: BillingMonth,
    /// Last month included.
    pub last: BillingMonth,
}

impl MonthRange {
    pub fn new(first: BillingMonth, last: BillingMonth) -> Self {
        Self { first, last }
    }

    pub fn single(month: BillingMonth) -> Self {
        Self::new(month, month)
    }

    pub fn contains(&self, month: BillingMonth) -> bool {
        self.first <= month && month <= self.last
    }
}
