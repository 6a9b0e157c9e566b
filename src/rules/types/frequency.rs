//! Purchase Frequency Rule

use serde::{Deserialize, Serialize};

use crate::{history::HistoryFacts, rules::RuleConfigError};

/// Bonus once a user reaches `threshold` purchases within the trailing `window_days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    /// Length of the trailing window, in days.
    pub window_days: u32,

    /// Minimum purchases inside the window.
    pub threshold: u64,

    /// Points awarded when the threshold is met.
    pub bonus_points: u64,
}

impl Frequency {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.window_days == 0 {
            return Err(RuleConfigError::Invalid {
                rule_type: "frequency",
                reason: "window_days must be positive",
            });
        }

        if self.threshold == 0 {
            return Err(RuleConfigError::Invalid {
                rule_type: "frequency",
                reason: "threshold must be positive",
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn points(&self, facts: &HistoryFacts) -> u64 {
        if facts.trailing_purchases >= self.threshold {
            self.bonus_points
        } else {
            0
        }
    }
}
