//! Rule Matcher
//!
//! `points(rule, payload, facts)` decides whether a rule fires for one event and how many points
//! it contributes; `0` means it did not fire. It is pure: everything it needs from the past is
//! pre-fetched into [`HistoryFacts`].

use crate::{history::HistoryFacts, payload::EventPayload, rules::Rule, rules::RuleConfig};

/// Points `rule` contributes for `payload`.
///
/// Multiplicative rules read `payload.base_points`; additive rules ignore it.
#[must_use]
pub fn points(rule: &Rule, payload: &EventPayload, facts: &HistoryFacts) -> u64 {
    if !facts.cooldown_elapsed(rule.cooldown_days, payload.occurred_at) {
        return 0;
    }

    match &rule.config {
        RuleConfig::ValueSpent(rule) => rule.points(payload),
        RuleConfig::Event(rule) => rule.points(payload),
        RuleConfig::Frequency(rule) => rule.points(facts),
        RuleConfig::Recurrence(rule) => rule.points(facts),
        RuleConfig::FirstPurchase(rule) => rule.points(payload, facts),
        RuleConfig::Category(rule) => rule.points(payload),
        RuleConfig::Inventory(rule) => rule.points(payload),
        RuleConfig::SpecialDate(rule) => rule.points(payload),
        RuleConfig::DigitalBehavior(rule) => rule.points(payload, facts),
        RuleConfig::Geolocation(rule) => rule.points(payload),
    }
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, ToSpan};
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        rules::types::{Category, Frequency, ValueSpent},
        uuids::{CompanyUuid, RuleUuid},
    };

    use super::*;

    fn rule(config: RuleConfig, cooldown_days: u32) -> Rule {
        Rule {
            uuid: RuleUuid::new(),
            company: CompanyUuid::new(),
            name: "test".to_string(),
            active: true,
            visible: true,
            cooldown_days,
            config,
        }
    }

    #[test]
    fn value_spent_scenario() {
        let rule = rule(
            RuleConfig::ValueSpent(ValueSpent {
                step: dec!(10),
                points_per_step: 1,
            }),
            0,
        );

        let payload = EventPayload::purchase(dec!(55));

        assert_eq!(points(&rule, &payload, &HistoryFacts::default()), 5);
    }

    #[test]
    fn category_multiplier_scenario() {
        let rule = rule(
            RuleConfig::Category(Category {
                categories: ["catA".to_string()].into_iter().collect(),
                multiplier: dec!(2.0),
            }),
            0,
        );

        let payload = EventPayload::purchase(dec!(55))
            .with_categories(["catA"])
            .with_base_points(5);

        assert_eq!(points(&rule, &payload, &HistoryFacts::default()), 10);
    }

    #[test]
    fn cooldown_applies_to_every_rule_type() -> TestResult {
        let now = Timestamp::now();

        let rule = rule(
            RuleConfig::Frequency(Frequency {
                window_days: 30,
                threshold: 3,
                bonus_points: 20,
            }),
            1,
        );

        let payload = EventPayload::purchase(dec!(5)).at(now);

        let fresh = HistoryFacts {
            trailing_purchases: 3,
            ..HistoryFacts::default()
        };

        let just_awarded = HistoryFacts {
            last_award: Some(now),
            ..fresh.clone()
        };

        let awarded_yesterday = HistoryFacts {
            last_award: Some(now.checked_sub(25.hours())?),
            ..fresh.clone()
        };

        assert_eq!(points(&rule, &payload, &fresh), 20);
        assert_eq!(points(&rule, &payload, &just_awarded), 0);
        assert_eq!(points(&rule, &payload, &awarded_yesterday), 20);

        Ok(())
    }
}
