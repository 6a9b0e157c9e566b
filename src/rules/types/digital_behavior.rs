//! Digital Behaviour Rule
//!
//! Externally triggered actions (app install, review, referral) identified by a slug,
//! optionally limited to a campaign window and a per-user attribution cap.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{history::HistoryFacts, payload::EventPayload, rules::RuleConfigError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalBehavior {
    /// Action slug matched against the payload's `event`.
    pub slug: String,

    /// Points per attributed action.
    pub points: u64,

    /// Campaign start (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<Timestamp>,

    /// Campaign end (exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<Timestamp>,

    /// Maximum number of awards per user over the rule's lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_user: Option<u64>,
}

impl DigitalBehavior {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.slug.trim().is_empty() {
            return Err(RuleConfigError::Invalid {
                rule_type: "digital_behavior",
                reason: "slug must not be empty",
            });
        }

        if let (Some(starts_at), Some(ends_at)) = (self.starts_at, self.ends_at)
            && starts_at >= ends_at
        {
            return Err(RuleConfigError::Invalid {
                rule_type: "digital_behavior",
                reason: "starts_at must precede ends_at",
            });
        }

        if self.max_per_user == Some(0) {
            return Err(RuleConfigError::Invalid {
                rule_type: "digital_behavior",
                reason: "max_per_user must be positive when set",
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn points(&self, payload: &EventPayload, facts: &HistoryFacts) -> u64 {
        if payload.event.as_deref() != Some(self.slug.as_str()) {
            return 0;
        }

        let at = payload.occurred_at;

        if self.starts_at.is_some_and(|starts_at| at < starts_at)
            || self.ends_at.is_some_and(|ends_at| at >= ends_at)
        {
            return 0;
        }

        if self
            .max_per_user
            .is_some_and(|cap| facts.award_count >= cap)
        {
            return 0;
        }

        self.points
    }
}
