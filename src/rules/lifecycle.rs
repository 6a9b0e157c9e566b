//! Rule Lifecycle
//!
//! Rules move between `active` and `inactive`. Admins flip single rules; the engine flips every
//! rule of a company at once when a [`FundsExhausted`] event is raised.

use crate::{
    ledger::AccountKind,
    rules::StoredRule,
    uuids::{CompanyUuid, RuleUuid},
};

/// Raised when a matched rule cannot be paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundsExhausted {
    /// Company whose rules must all be deactivated.
    pub company: CompanyUuid,

    /// The rule whose funding failed.
    pub rule: RuleUuid,

    /// Which company wallet ran dry.
    pub account: AccountKind,

    /// Amount the award needed from that wallet.
    pub required: u64,

    /// Balance the wallet held.
    pub available: u64,
}

impl StoredRule {
    /// Apply a funds-exhausted event; returns whether this rule changed state.
    pub fn apply_funds_exhausted(&mut self, event: &FundsExhausted) -> bool {
        if self.company != event.company || !self.active {
            return false;
        }

        self.active = false;

        true
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rule(company: CompanyUuid, rule_type: &str) -> StoredRule {
        StoredRule {
            uuid: RuleUuid::new(),
            company,
            name: "rule".to_string(),
            active: true,
            visible: true,
            rule_type: rule_type.to_string(),
            config: json!({ "bonus_points": 5 }),
        }
    }

    #[test]
    fn exhaustion_deactivates_only_the_affected_company() {
        let company = CompanyUuid::new();
        let other = CompanyUuid::new();

        let mut own = rule(company, "first_purchase");
        // Unparseable rules are deactivated too.
        let mut sibling = rule(company, "retired_type");
        let mut foreign = rule(other, "first_purchase");

        let event = FundsExhausted {
            company,
            rule: own.uuid,
            account: AccountKind::CompanyFees,
            required: 10,
            available: 0,
        };

        assert!(own.apply_funds_exhausted(&event));
        assert!(sibling.apply_funds_exhausted(&event));
        assert!(!foreign.apply_funds_exhausted(&event));

        assert!(!own.active);
        assert!(!sibling.active);
        assert!(foreign.active);

        // Already inactive: no further transition.
        assert!(!own.apply_funds_exhausted(&event));
    }

    #[test]
    fn admins_can_reactivate() {
        let mut stored = rule(CompanyUuid::new(), "first_purchase");

        stored.deactivate();
        assert!(!stored.active);

        stored.activate();
        assert!(stored.active);
    }
}
