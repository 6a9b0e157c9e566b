//! Rules
//!
//! A rule is a company-configured condition that turns a business event into points. The
//! configuration is a tagged union with one variant per rule type; it is validated when a rule is
//! written and re-parsed when stored rules are loaded, so a config that no longer parses fails
//! closed instead of being guessed at.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::uuids::{CompanyUuid, RuleUuid};

pub mod dates;
mod errors;
pub mod lifecycle;
pub mod types;

pub use errors::RuleConfigError;
pub use lifecycle::FundsExhausted;

use types::{
    Category, DigitalBehavior, FirstPurchase, Frequency, Geolocation, Inventory, NamedEvent,
    Recurrence, SpecialDate, ValueSpent,
};

/// Evaluation phase a rule type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Contributes points independently of other rules.
    Additive,

    /// Contributes a multiple of the additive subtotal (`base_points`).
    Multiplicative,
}

/// Discriminant of [`RuleConfig`], stored as the `rule_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    ValueSpent,
    Event,
    Frequency,
    Category,
    FirstPurchase,
    Recurrence,
    DigitalBehavior,
    SpecialDate,
    Geolocation,
    Inventory,
}

impl RuleType {
    /// All rule types, in documentation order.
    pub const ALL: [Self; 10] = [
        Self::ValueSpent,
        Self::Event,
        Self::Frequency,
        Self::Category,
        Self::FirstPurchase,
        Self::Recurrence,
        Self::DigitalBehavior,
        Self::SpecialDate,
        Self::Geolocation,
        Self::Inventory,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValueSpent => "value_spent",
            Self::Event => "event",
            Self::Frequency => "frequency",
            Self::Category => "category",
            Self::FirstPurchase => "first_purchase",
            Self::Recurrence => "recurrence",
            Self::DigitalBehavior => "digital_behavior",
            Self::SpecialDate => "special_date",
            Self::Geolocation => "geolocation",
            Self::Inventory => "inventory",
        }
    }

    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            Self::Category | Self::SpecialDate | Self::Inventory => Phase::Multiplicative,
            Self::ValueSpent
            | Self::Event
            | Self::Frequency
            | Self::FirstPurchase
            | Self::Recurrence
            | Self::DigitalBehavior
            | Self::Geolocation => Phase::Additive,
        }
    }
}

impl Display for RuleType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = RuleConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rule_type| rule_type.as_str() == s)
            .ok_or_else(|| RuleConfigError::UnknownRuleType(s.to_string()))
    }
}

/// Typed rule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_type", content = "config", rename_all = "snake_case")]
pub enum RuleConfig {
    ValueSpent(ValueSpent),
    Event(NamedEvent),
    Frequency(Frequency),
    Category(Category),
    FirstPurchase(FirstPurchase),
    Recurrence(Recurrence),
    DigitalBehavior(DigitalBehavior),
    SpecialDate(SpecialDate),
    Geolocation(Geolocation),
    Inventory(Inventory),
}

impl RuleConfig {
    /// Decode and validate a stored `(rule_type, config)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::UnknownRuleType`] for unrecognised types,
    /// [`RuleConfigError::Malformed`] when the JSON does not fit the type's shape, and
    /// [`RuleConfigError::Invalid`] when it fits but breaks a numeric or range invariant.
    pub fn parse(rule_type: &str, config: &Value) -> Result<Self, RuleConfigError> {
        let rule_type = rule_type.parse::<RuleType>()?;

        let parsed = match rule_type {
            RuleType::ValueSpent => Self::ValueSpent(decode(rule_type, config)?),
            RuleType::Event => Self::Event(decode(rule_type, config)?),
            RuleType::Frequency => Self::Frequency(decode(rule_type, config)?),
            RuleType::Category => Self::Category(decode(rule_type, config)?),
            RuleType::FirstPurchase => Self::FirstPurchase(decode(rule_type, config)?),
            RuleType::Recurrence => Self::Recurrence(decode(rule_type, config)?),
            RuleType::DigitalBehavior => Self::DigitalBehavior(decode(rule_type, config)?),
            RuleType::SpecialDate => Self::SpecialDate(decode(rule_type, config)?),
            RuleType::Geolocation => Self::Geolocation(decode(rule_type, config)?),
            RuleType::Inventory => Self::Inventory(decode(rule_type, config)?),
        };

        parsed.validate()?;

        Ok(parsed)
    }

    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::Invalid`] describing the first broken invariant.
    pub fn validate(&self) -> Result<(), RuleConfigError> {
        match self {
            Self::ValueSpent(rule) => rule.validate(),
            Self::Event(rule) => rule.validate(),
            Self::Frequency(rule) => rule.validate(),
            Self::Category(rule) => rule.validate(),
            Self::FirstPurchase(_) => Ok(()),
            Self::Recurrence(rule) => rule.validate(),
            Self::DigitalBehavior(rule) => rule.validate(),
            Self::SpecialDate(rule) => rule.validate(),
            Self::Geolocation(rule) => rule.validate(),
            Self::Inventory(rule) => rule.validate(),
        }
    }

    #[must_use]
    pub const fn rule_type(&self) -> RuleType {
        match self {
            Self::ValueSpent(_) => RuleType::ValueSpent,
            Self::Event(_) => RuleType::Event,
            Self::Frequency(_) => RuleType::Frequency,
            Self::Category(_) => RuleType::Category,
            Self::FirstPurchase(_) => RuleType::FirstPurchase,
            Self::Recurrence(_) => RuleType::Recurrence,
            Self::DigitalBehavior(_) => RuleType::DigitalBehavior,
            Self::SpecialDate(_) => RuleType::SpecialDate,
            Self::Geolocation(_) => RuleType::Geolocation,
            Self::Inventory(_) => RuleType::Inventory,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.rule_type().phase()
    }

    /// The variant's config object, without the type tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be represented as JSON.
    pub fn config_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::ValueSpent(rule) => serde_json::to_value(rule),
            Self::Event(rule) => serde_json::to_value(rule),
            Self::Frequency(rule) => serde_json::to_value(rule),
            Self::Category(rule) => serde_json::to_value(rule),
            Self::FirstPurchase(rule) => serde_json::to_value(rule),
            Self::Recurrence(rule) => serde_json::to_value(rule),
            Self::DigitalBehavior(rule) => serde_json::to_value(rule),
            Self::SpecialDate(rule) => serde_json::to_value(rule),
            Self::Geolocation(rule) => serde_json::to_value(rule),
            Self::Inventory(rule) => serde_json::to_value(rule),
        }
    }
}

fn decode<T: DeserializeOwned>(rule_type: RuleType, config: &Value) -> Result<T, RuleConfigError> {
    T::deserialize(config).map_err(|source| RuleConfigError::Malformed {
        rule_type: rule_type.as_str(),
        source,
    })
}

/// Settings every rule type accepts alongside its own config keys.
#[derive(Debug, Default, Deserialize)]
struct SharedSettings {
    #[serde(default)]
    cooldown_days: u32,
}

/// A parsed, typed rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub uuid: RuleUuid,
    pub company: CompanyUuid,
    pub name: String,

    /// Only active rules are evaluated.
    pub active: bool,

    /// Display concern only; ignored by evaluation.
    pub visible: bool,

    /// Minimum days between two awards of this rule to the same user; `0` disables.
    pub cooldown_days: u32,

    pub config: RuleConfig,
}

impl Rule {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.config.phase()
    }
}

/// A rule as persisted: the type tag and config are still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRule {
    pub uuid: RuleUuid,
    pub company: CompanyUuid,
    pub name: String,
    pub active: bool,
    pub visible: bool,
    pub rule_type: String,
    pub config: Value,
}

impl StoredRule {
    /// Parse into a typed [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns the [`RuleConfigError`] from [`RuleConfig::parse`].
    pub fn parse(&self) -> Result<Rule, RuleConfigError> {
        let config = RuleConfig::parse(&self.rule_type, &self.config)?;

        let shared =
            SharedSettings::deserialize(&self.config).map_err(|source| RuleConfigError::Malformed {
                rule_type: config.rule_type().as_str(),
                source,
            })?;

        Ok(Rule {
            uuid: self.uuid,
            company: self.company,
            name: self.name.clone(),
            active: self.active,
            visible: self.visible,
            cooldown_days: shared.cooldown_days,
            config,
        })
    }
}

/// New rule data, validated before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
    pub uuid: RuleUuid,
    pub name: String,
    pub visible: bool,
    pub cooldown_days: u32,
    pub config: RuleConfig,
}

impl NewRule {
    /// Build a visible rule without a cooldown.
    #[must_use]
    pub fn new(name: impl Into<String>, config: RuleConfig) -> Self {
        Self {
            uuid: RuleUuid::new(),
            name: name.into(),
            visible: true,
            cooldown_days: 0,
            config,
        }
    }

    #[must_use]
    pub fn with_cooldown_days(mut self, cooldown_days: u32) -> Self {
        self.cooldown_days = cooldown_days;
        self
    }

    /// Validate and flatten into the `(rule_type, config)` pair that gets persisted.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError`] when the config breaks its invariants.
    pub fn to_stored(&self, company: CompanyUuid) -> Result<StoredRule, RuleConfigError> {
        self.config.validate()?;

        let rule_type = self.config.rule_type();

        let mut config = self
            .config
            .config_value()
            .map_err(|source| RuleConfigError::Malformed {
                rule_type: rule_type.as_str(),
                source,
            })?;

        if self.cooldown_days > 0
            && let Value::Object(map) = &mut config
        {
            map.insert("cooldown_days".to_string(), Value::from(self.cooldown_days));
        }

        Ok(StoredRule {
            uuid: self.uuid,
            company,
            name: self.name.clone(),
            active: true,
            visible: self.visible,
            rule_type: rule_type.as_str().to_string(),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn phases_split_additive_from_multiplicative() {
        let multiplicative: Vec<_> = RuleType::ALL
            .into_iter()
            .filter(|rule_type| rule_type.phase() == Phase::Multiplicative)
            .collect();

        assert_eq!(
            multiplicative,
            vec![RuleType::Category, RuleType::SpecialDate, RuleType::Inventory]
        );
    }

    #[test]
    fn rule_type_names_round_trip_through_from_str() -> TestResult {
        for rule_type in RuleType::ALL {
            assert_eq!(rule_type.as_str().parse::<RuleType>()?, rule_type);
        }

        Ok(())
    }

    #[test]
    fn parses_stored_config() -> TestResult {
        let config = RuleConfig::parse("value_spent", &json!({ "step": 10, "points_per_step": 1 }))?;

        assert_eq!(
            config,
            RuleConfig::ValueSpent(ValueSpent {
                step: dec!(10),
                points_per_step: 1
            })
        );

        Ok(())
    }

    #[test]
    fn unknown_rule_type_is_reported() {
        let result = RuleConfig::parse("cashback", &json!({}));

        assert!(
            matches!(result, Err(RuleConfigError::UnknownRuleType(ref name)) if name == "cashback"),
            "expected UnknownRuleType, got {result:?}"
        );
    }

    #[test]
    fn missing_key_is_malformed() {
        let result = RuleConfig::parse("event", &json!({ "points": 5 }));

        assert!(
            matches!(result, Err(RuleConfigError::Malformed { rule_type: "event", .. })),
            "expected Malformed, got {result:?}"
        );
    }

    #[test]
    fn invariants_are_checked_on_parse() {
        let result = RuleConfig::parse(
            "frequency",
            &json!({ "window_days": 0, "threshold": 3, "bonus_points": 20 }),
        );

        assert!(
            matches!(result, Err(RuleConfigError::Invalid { rule_type: "frequency", .. })),
            "expected Invalid, got {result:?}"
        );
    }

    #[test]
    fn tagged_json_form() -> TestResult {
        let config: RuleConfig = serde_json::from_value(json!({
            "rule_type": "category",
            "config": { "categories": ["catA"], "multiplier": 2.0 }
        }))?;

        assert_eq!(config.rule_type(), RuleType::Category);
        assert_eq!(config.phase(), Phase::Multiplicative);

        Ok(())
    }

    #[test]
    fn new_rule_persists_cooldown_alongside_config() -> TestResult {
        let company = CompanyUuid::new();

        let new_rule = NewRule::new(
            "Loyal shopper",
            RuleConfig::Frequency(Frequency {
                window_days: 30,
                threshold: 3,
                bonus_points: 20,
            }),
        )
        .with_cooldown_days(1);

        let stored = new_rule.to_stored(company)?;

        assert_eq!(stored.rule_type, "frequency");
        assert_eq!(stored.config["cooldown_days"], json!(1));
        assert!(stored.active);

        let rule = stored.parse()?;

        assert_eq!(rule.cooldown_days, 1);
        assert_eq!(rule.config, new_rule.config);

        Ok(())
    }

    #[test]
    fn invalid_new_rule_is_rejected_before_storage() {
        let new_rule = NewRule::new(
            "Broken",
            RuleConfig::ValueSpent(ValueSpent {
                step: dec!(0),
                points_per_step: 1,
            }),
        );

        assert!(new_rule.to_stored(CompanyUuid::new()).is_err());
    }
}
