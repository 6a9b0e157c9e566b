//! Rule configuration errors.

use thiserror::Error;

/// Why a rule configuration was rejected.
#[derive(Debug, Error)]
pub enum RuleConfigError {
    #[error("unknown rule type `{0}`")]
    UnknownRuleType(String),

    #[error("malformed `{rule_type}` config")]
    Malformed {
        rule_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid `{rule_type}` config: {reason}")]
    Invalid {
        rule_type: &'static str,
        reason: &'static str,
    },

    #[error("invalid month-day `{0}`, expected MM-DD")]
    MonthDay(String),
}
