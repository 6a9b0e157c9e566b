//! Value Spent Rule
//!
//! Awards a fixed number of points for every whole `step` of money spent.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{payload::EventPayload, rules::RuleConfigError};

/// `floor(amount / step) * points_per_step`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSpent {
    /// Amount of money per award step.
    pub step: Decimal,

    /// Points per completed step.
    pub points_per_step: u64,
}

impl ValueSpent {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.step <= Decimal::ZERO {
            return Err(RuleConfigError::Invalid {
                rule_type: "value_spent",
                reason: "step must be positive",
            });
        }

        Ok(())
    }

    /// Points earned by the payload's `amount_spent`; zero when absent or negative.
    #[must_use]
    pub fn points(&self, payload: &EventPayload) -> u64 {
        let Some(amount) = payload.amount_spent else {
            return 0;
        };

        let steps = amount
            .checked_div(self.step)
            .map(|steps| steps.floor())
            .and_then(|steps| steps.to_u64())
            .unwrap_or(0);

        steps.saturating_mul(self.points_per_step)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn rule() -> ValueSpent {
        ValueSpent {
            step: dec!(10),
            points_per_step: 1,
        }
    }

    #[test]
    fn awards_per_whole_step() {
        let payload = EventPayload::purchase(dec!(55));

        assert_eq!(rule().points(&payload), 5);
    }

    #[test]
    fn partial_steps_are_floored() {
        assert_eq!(rule().points(&EventPayload::purchase(dec!(9.99))), 0);
        assert_eq!(rule().points(&EventPayload::purchase(dec!(10))), 1);
        assert_eq!(rule().points(&EventPayload::purchase(dec!(19.99))), 1);
    }

    #[test]
    fn fractional_steps_and_multi_point_steps() {
        let rule = ValueSpent {
            step: dec!(2.5),
            points_per_step: 3,
        };

        assert_eq!(rule.points(&EventPayload::purchase(dec!(10))), 12);
    }

    #[test]
    fn missing_or_negative_amount_awards_nothing() {
        assert_eq!(rule().points(&EventPayload::default()), 0);
        assert_eq!(rule().points(&EventPayload::purchase(dec!(-50))), 0);
    }

    #[test]
    fn rejects_non_positive_step() {
        let rule = ValueSpent {
            step: Decimal::ZERO,
            points_per_step: 1,
        };

        assert!(rule.validate().is_err());
    }
}
