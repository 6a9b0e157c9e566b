//! Event Payload
//!
//! The per-invocation description of a business event. It is never persisted; the evaluator
//! copies it between phases and injects `base_points` before the multiplicative phase.

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A business event to evaluate rules against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Money spent on the purchase, if any.
    #[serde(default)]
    pub amount_spent: Option<Decimal>,

    /// Purchased item ids.
    #[serde(default)]
    pub purchased_items: Vec<String>,

    /// Category ids the purchased items resolve to.
    #[serde(default)]
    pub product_categories: Vec<String>,

    /// Named event or digital action slug.
    #[serde(default)]
    pub event: Option<String>,

    /// Branch where the event happened.
    #[serde(default)]
    pub branch_id: Option<String>,

    /// Visit counter maintained by the caller.
    #[serde(default)]
    pub visit_count: Option<u32>,

    /// Caller's own first-purchase determination.
    #[serde(default)]
    pub is_first: Option<bool>,

    /// When the event happened; all history windows and cooldowns are measured from here.
    #[serde(default = "Timestamp::now")]
    pub occurred_at: Timestamp,

    /// Additive subtotal, set by the evaluator for the multiplicative phase.
    #[serde(default)]
    pub base_points: Option<u64>,
}

impl EventPayload {
    /// A purchase of `amount` happening now.
    #[must_use]
    pub fn purchase(amount: Decimal) -> Self {
        Self {
            amount_spent: Some(amount),
            occurred_at: Timestamp::now(),
            ..Self::default()
        }
    }

    /// A named event happening now.
    #[must_use]
    pub fn named_event(name: impl Into<String>) -> Self {
        Self {
            event: Some(name.into()),
            occurred_at: Timestamp::now(),
            ..Self::default()
        }
    }

    /// Move the event to `occurred_at`.
    #[must_use]
    pub fn at(mut self, occurred_at: Timestamp) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.purchased_items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Copy of the payload as seen by the multiplicative phase.
    #[must_use]
    pub fn with_base_points(&self, base_points: u64) -> Self {
        Self {
            base_points: Some(base_points),
            ..self.clone()
        }
    }

    /// Copy of the payload as seen by the additive phase, which never sees `base_points`.
    #[must_use]
    pub fn without_base_points(&self) -> Self {
        Self {
            base_points: None,
            ..self.clone()
        }
    }

    /// Calendar day of the event in UTC.
    #[must_use]
    pub fn date(&self) -> Date {
        self.occurred_at.to_zoned(TimeZone::UTC).date()
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn deserializes_sparse_payloads() -> TestResult {
        let payload: EventPayload = serde_json::from_value(json!({
            "amount_spent": "55.00",
            "product_categories": ["catA"],
            "occurred_at": "2026-03-01T10:00:00Z"
        }))?;

        assert_eq!(payload.amount_spent, Some(Decimal::new(5500, 2)));
        assert_eq!(payload.product_categories, vec!["catA".to_string()]);
        assert!(payload.base_points.is_none());
        assert_eq!(payload.date(), date(2026, 3, 1));

        Ok(())
    }

    #[test]
    fn base_points_injection_does_not_touch_original() {
        let payload = EventPayload::purchase(Decimal::TEN);
        let augmented = payload.with_base_points(5);

        assert_eq!(augmented.base_points, Some(5));
        assert!(payload.base_points.is_none());
        assert!(augmented.without_base_points().base_points.is_none());
    }
}
