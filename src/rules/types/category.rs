//! Category Multiplier Rule

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

/// Multiplies the additive subtotal when any purchased category is listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category ids that trigger the multiplier.
    pub categories: FxHashSet<String>,

    /// Factor applied to `base_points`.
    pub multiplier: Decimal,
}

impl Category {
    pub(crate) fn validate(&self) -> Result<(), RuleConfigError> {
        if self.categories.is_empty() {
            return Err(RuleConfigError::Invalid {
                rule_type: "category",
                reason: "categories must not be empty",
            });
        }

        validate_multiplier("category", self.multiplier)
    }

    #[must_use]
    pub fn points(&self, payload: &EventPayload) -> u64 {
        let matched = payload
            .product_categories
            .iter()
            .any(|category| self.categories.contains(category));

        if matched {
            multiply(payload.base_points.unwrap_or(0), self.multiplier)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn rule() -> Category {
        Category {
            categories: ["catA".to_string()].into_iter().collect(),
            multiplier: dec!(2.0),
        }
    }

    #[test]
    fn multiplies_base_points_on_category_hit() {
        let payload = EventPayload {
            product_categories: vec!["catB".to_string(), "catA".to_string()],
            base_points: Some(5),
            ..EventPayload::default()
        };

        assert_eq!(rule().points(&payload), 10);
    }

    #[test]
    fn no_category_hit_or_no_base_awards_nothing() {
        let miss = EventPayload {
            product_categories: vec!["catB".to_string()],
            base_points: Some(5),
            ..EventPayload::default()
        };

        let no_base = EventPayload {
            product_categories: vec!["catA".to_string()],
            ..EventPayload::default()
        };

        assert_eq!(rule().points(&miss), 0);
        assert_eq!(rule().points(&no_base), 0);
    }
}
