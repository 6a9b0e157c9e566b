//! Named Event Rule

use serde::{Deserialize, Serialize};

use crate::{payload::EventPayload, rules::RuleConfigError};

/// Fixed points whenever the payload carries the configured event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEvent {
    /// Event name to listen for (compared exactly).
    pub event_name: String,

    /// Points per occurrence.
    pub points: u64,
}

impl NamedEvent {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.event_name.trim().is_empty() {
            return Err(RuleConfigError::Invalid {
                rule_type: "event",
                reason: "event_name must not be empty",
            });
        }

        Ok(())
    }

    /// Points for the payload's event.
    #[must_use]
    pub fn points(&self, payload: &EventPayload) -> u64 {
        if payload.event.as_deref() == Some(self.event_name.as_str()) {
            self.points
        } else {
            0
        }
    }
}
