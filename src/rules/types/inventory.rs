//! Inventory (Item) Multiplier Rule

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    payload::EventPayload,
    rules::{
        RuleConfigError,
        types::{multiply, validate_multiplier},
    },
};

/// Multiplies the additive subtotal when a listed item was purchased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Item ids that trigger the multiplier.
    pub item_ids: FxHashSet<String>,

    /// Factor applied to `base_points`.
    pub multiplier: Decimal,
}

impl Inventory {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.item_ids.is_empty() {
            return Err(RuleConfigError::Invalid {
                rule_type: "inventory",
                reason: "item_ids must not be empty",
            });
        }

        validate_multiplier("inventory", self.multiplier)
    }

    #[must_use]
    pub fn points(&self, payload: &EventPayload) -> u64 {
        let matched = payload
            .purchased_items
            .iter()
            .any(|item| self.item_ids.contains(item));

        if matched {
            multiply(payload.base_points.unwrap_or(0), self.multiplier)
        } else {
            0
        }
    }
}
