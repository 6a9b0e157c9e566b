//! Special Date Multiplier Rule

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    payload::EventPayload,
    rules::{
        RuleConfigError,
        dates::{DateRange, MonthDay},
        types::{multiply, validate_multiplier},
    },
};

/// Multiplies the additive subtotal on recurring days or inside promotional date ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialDate {
    /// Recurring days, `MM-DD`.
    #[serde(default)]
    pub dates: Vec<MonthDay>,

    /// One-off inclusive ranges.
    #[serde(default)]
    pub ranges: Vec<DateRange>,

    /// Factor applied to `base_points`.
    pub multiplier: Decimal,
}

impl SpecialDate {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.dates.is_empty() && self.ranges.is_empty() {
            return Err(RuleConfigError::Invalid {
                rule_type: "special_date",
                reason: "at least one date or range is required",
            });
        }

        if self.ranges.iter().any(|range| range.start > range.end) {
            return Err(RuleConfigError::Invalid {
                rule_type: "special_date",
                reason: "range start must not be after its end",
            });
        }

        validate_multiplier("special_date", self.multiplier)
    }

    #[must_use]
    pub fn points(&self, payload: &EventPayload) -> u64 {
        let today = payload.date();

        let matched = self.dates.iter().any(|day| day.matches(today))
            || self.ranges.iter().any(|range| range.contains(today));

        if matched {
            multiply(payload.base_points.unwrap_or(0), self.multiplier)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::{civil::date, tz::TimeZone};
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    fn payload_on(year: i16, month: i8, day: i8) -> TestResult<EventPayload> {
        let occurred_at = date(year, month, day)
            .at(12, 0, 0, 0)
            .to_zoned(TimeZone::UTC)?
            .timestamp();

        Ok(EventPayload {
            base_points: Some(10),
            ..EventPayload::default().at(occurred_at)
        })
    }

    #[test]
    fn fires_on_recurring_day() -> TestResult {
        let rule = SpecialDate {
            dates: vec![MonthDay::new(7, 4)?],
            ranges: Vec::new(),
            multiplier: dec!(3),
        };

        assert_eq!(rule.points(&payload_on(2026, 7, 4)?), 30);
        assert_eq!(rule.points(&payload_on(2026, 7, 5)?), 0);

        Ok(())
    }

    #[test]
    fn fires_inside_range() -> TestResult {
        let rule = SpecialDate {
            dates: Vec::new(),
            ranges: vec![DateRange {
                start: date(2026, 11, 27),
                end: date(2026, 11, 30),
            }],
            multiplier: dec!(1.25),
        };

        assert_eq!(rule.points(&payload_on(2026, 11, 28)?), 12);
        assert_eq!(rule.points(&payload_on(2025, 11, 28)?), 0);

        Ok(())
    }

    #[test]
    fn rejects_inverted_range() {
        let rule = SpecialDate {
            dates: Vec::new(),
            ranges: vec![DateRange {
                start: date(2026, 12, 1),
                end: date(2026, 11, 1),
            }],
            multiplier: dec!(2),
        };

        assert!(rule.validate().is_err());
    }
}
