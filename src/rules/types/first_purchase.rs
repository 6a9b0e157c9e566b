//! First Purchase Rule

use serde::{Deserialize, Serialize};

use crate::{history::HistoryFacts, payload::EventPayload};

/// Bonus on a user's first purchase with the company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstPurchase {
    /// Points awarded on the first purchase.
    pub bonus_points: u64,
}

impl FirstPurchase {
    /// A caller-declared `is_first` wins; otherwise the logged purchase must be the only one.
    #[must_use]
    pub fn points(&self, payload: &EventPayload, facts: &HistoryFacts) -> u64 {
        let first = payload
            .is_first
            .unwrap_or(facts.lifetime_purchases == 1);

        if first { self.bonus_points } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_lifetime_count() {
        let rule = FirstPurchase { bonus_points: 100 };
        let payload = EventPayload::default();

        let facts = |lifetime_purchases| HistoryFacts {
            lifetime_purchases,
            ..HistoryFacts::default()
        };

        assert_eq!(rule.points(&payload, &facts(1)), 100);
        assert_eq!(rule.points(&payload, &facts(0)), 0);
        assert_eq!(rule.points(&payload, &facts(2)), 0);
    }

    #[test]
    fn caller_declaration_overrides_history() {
        let rule = FirstPurchase { bonus_points: 100 };

        let declared_first = EventPayload {
            is_first: Some(true),
            ..EventPayload::default()
        };

        let declared_repeat = EventPayload {
            is_first: Some(false),
            ..EventPayload::default()
        };

        let one_purchase = HistoryFacts {
            lifetime_purchases: 1,
            ..HistoryFacts::default()
        };

        assert_eq!(rule.points(&declared_first, &HistoryFacts::default()), 100);
        assert_eq!(rule.points(&declared_repeat, &one_purchase), 0);
    }
}
