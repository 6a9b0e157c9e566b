//! Recurrence (Streak) Rule
//!
//! Rewards users who keep purchasing across several consecutive, non-overlapping periods.
//! Period `0` is the one ending at the event, period `1` the one before it, and so on.

use serde::{Deserialize, Serialize};

use crate::{history::HistoryFacts, rules::RuleConfigError};

/// Bonus for a streak of `consecutive_periods` periods each holding enough purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Length of one period, in days.
    pub period_days: u32,

    /// Number of back-to-back periods that must qualify.
    pub consecutive_periods: u32,

    /// Minimum purchases inside each period.
    pub threshold_per_period: u64,

    /// Points awarded for a complete streak.
    pub bonus_points: u64,
}

impl Recurrence {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.period_days == 0 {
            return Err(RuleConfigError::Invalid {
                rule_type: "recurrence",
                reason: "period_days must be positive",
            });
        }

        if self.consecutive_periods == 0 {
            return Err(RuleConfigError::Invalid {
                rule_type: "recurrence",
                reason: "consecutive_periods must be positive",
            });
        }

        if self.threshold_per_period == 0 {
            return Err(RuleConfigError::Invalid {
                rule_type: "recurrence",
                reason: "threshold_per_period must be positive",
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn points(&self, facts: &HistoryFacts) -> u64 {
        let periods = usize::try_from(self.consecutive_periods).unwrap_or(usize::MAX);

        let streak = facts.period_purchases.len() >= periods
            && facts
                .period_purchases
                .iter()
                .take(periods)
                .all(|count| *count >= self.threshold_per_period);

        if streak { self.bonus_points } else { 0 }
    }
}
