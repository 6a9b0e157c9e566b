//! Calendar matching for special-date rules.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::rules::RuleConfigError;

/// Leap year used to validate `02-29`.
const LEAP_YEAR: i16 = 2024;

/// A recurring calendar day, written `MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: i8,
    day: i8,
}

impl MonthDay {
    /// Create a month-day, rejecting days that never exist (e.g. `04-31`).
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::MonthDay`] when the pair is not a real calendar day.
    pub fn new(month: i8, day: i8) -> Result<Self, RuleConfigError> {
        Date::new(LEAP_YEAR, month, day)
            .map(|_| Self { month, day })
            .map_err(|_source| RuleConfigError::MonthDay(format!("{month:02}-{day:02}")))
    }

    /// Whether `date` falls on this month-day in any year.
    #[must_use]
    pub fn matches(&self, date: Date) -> bool {
        date.month() == self.month && date.day() == self.day
    }
}

impl Display for MonthDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = RuleConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let invalid = || RuleConfigError::MonthDay(value.clone());

        let (month, day) = value.split_once('-').ok_or_else(invalid)?;

        if month.len() != 2 || day.len() != 2 {
            return Err(invalid());
        }

        let month = month.parse::<i8>().map_err(|_source| invalid())?;
        let day = day.parse::<i8>().map_err(|_source| invalid())?;

        Self::new(month, day)
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range.
    pub start: Date,

    /// Last day of the range (inclusive).
    pub end: Date,
}

impl DateRange {
    /// Whether `date` lies within the range.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn parses_and_matches_month_day() -> Result<(), RuleConfigError> {
        let christmas = MonthDay::try_from("12-25".to_string())?;

        assert!(christmas.matches(date(2025, 12, 25)));
        assert!(christmas.matches(date(1999, 12, 25)));
        assert!(!christmas.matches(date(2025, 12, 24)));
        assert_eq!(christmas.to_string(), "12-25");

        Ok(())
    }

    #[test]
    fn accepts_leap_day() {
        assert!(MonthDay::try_from("02-29".to_string()).is_ok());
    }

    #[test]
    fn rejects_impossible_or_badly_formatted_days() {
        for raw in ["04-31", "13-01", "1-05", "12/25", "aa-bb", ""] {
            assert!(
                MonthDay::try_from(raw.to_string()).is_err(),
                "expected `{raw}` to be rejected"
            );
        }
    }

    #[test]
    fn range_is_inclusive() {
        let range = DateRange {
            start: date(2025, 11, 28),
            end: date(2025, 12, 1),
        };

        assert!(range.contains(date(2025, 11, 28)));
        assert!(range.contains(date(2025, 12, 1)));
        assert!(!range.contains(date(2025, 12, 2)));
        assert!(!range.contains(date(2025, 11, 27)));
    }
}
