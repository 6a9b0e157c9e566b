//! Geolocation (Branch Visit) Rule

use serde::{Deserialize, Serialize};

use crate::{payload::EventPayload, rules::RuleConfigError};

/// Fixed points when the event happened at a given branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geolocation {
    /// Branch that must match the payload's `branch_id`.
    pub branch_id: String,

    /// Points per qualifying event.
    pub points: u64,
}

impl Geolocation {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.branch_id.trim().is_empty() {
            return Err(RuleConfigError::Invalid {
                rule_type: "geolocation",
                reason: "branch_id must not be empty",
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn points(&self, payload: &EventPayload) -> u64 {
        if payload.branch_id.as_deref() == Some(self.branch_id.as_str()) {
            self.points
        } else {
            0
        }
    }
}
