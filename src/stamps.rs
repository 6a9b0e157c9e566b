//! Stamp-Card Matcher
//!
//! A stamp card template carries an ordered list of rules. A scanned code advances the card by
//! one stamp when any rule matches; the first match wins and nothing is summed.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Condition that earns a stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum StampRule {
    /// Purchase of at least `min_amount`.
    PurchaseAmount { min_amount: Decimal },

    /// Any visit.
    Visit,

    /// Any of the listed products.
    ProductBought { product_ids: FxHashSet<String> },

    /// Any product in the listed categories.
    CategoryBought { category_ids: FxHashSet<String> },

    /// Any of the listed services.
    ServiceDone { service_ids: FxHashSet<String> },

    /// A named custom event.
    CustomEvent { event_name: String },
}

/// What a scanned code tells us about the visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StampScan {
    #[serde(default)]
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub is_visit: bool,

    #[serde(default)]
    pub product_ids: Vec<String>,

    #[serde(default)]
    pub category_ids: Vec<String>,

    #[serde(default)]
    pub service_ids: Vec<String>,

    #[serde(default)]
    pub event: Option<String>,
}

impl StampRule {
    #[must_use]
    pub fn matches(&self, scan: &StampScan) -> bool {
        match self {
            Self::PurchaseAmount { min_amount } => {
                scan.amount.is_some_and(|amount| amount >= *min_amount)
            }
            Self::Visit => scan.is_visit,
            Self::ProductBought { product_ids } => {
                scan.product_ids.iter().any(|id| product_ids.contains(id))
            }
            Self::CategoryBought { category_ids } => {
                scan.category_ids.iter().any(|id| category_ids.contains(id))
            }
            Self::ServiceDone { service_ids } => {
                scan.service_ids.iter().any(|id| service_ids.contains(id))
            }
            Self::CustomEvent { event_name } => scan.event.as_deref() == Some(event_name.as_str()),
        }
    }
}

/// Index and rule of the first rule that matches `scan`.
#[must_use]
pub fn first_match<'a>(rules: &'a [StampRule], scan: &StampScan) -> Option<(usize, &'a StampRule)> {
    rules.iter().enumerate().find(|(_, rule)| rule.matches(scan))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampCardError {
    #[error("a stamp card needs at least one stamp to complete")]
    NoStampsRequired,
}

/// Progress of a single user's card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampCard {
    stamps: u32,
    required: u32,
}

/// Result of a stamp attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampProgress {
    /// No rule matched; the card is unchanged.
    NotEligible,

    /// One stamp added; `remaining` stamps to go.
    Advanced { stamps: u32, remaining: u32 },

    /// This stamp completed the card.
    Completed,

    /// The card was already complete.
    AlreadyComplete,
}

impl StampCard {
    /// A fresh card needing `required` stamps.
    ///
    /// # Errors
    ///
    /// Returns [`StampCardError::NoStampsRequired`] when `required` is zero.
    pub fn new(required: u32) -> Result<Self, StampCardError> {
        if required == 0 {
            return Err(StampCardError::NoStampsRequired);
        }

        Ok(Self {
            stamps: 0,
            required,
        })
    }

    #[must_use]
    pub const fn stamps(&self) -> u32 {
        self.stamps
    }

    #[must_use]
    pub const fn required(&self) -> u32 {
        self.required
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.stamps >= self.required
    }

    /// Add one stamp if any of `rules` matches `scan`.
    pub fn advance(&mut self, rules: &[StampRule], scan: &StampScan) -> StampProgress {
        if self.is_complete() {
            return StampProgress::AlreadyComplete;
        }

        if first_match(rules, scan).is_none() {
            return StampProgress::NotEligible;
        }

        self.stamps += 1;

        if self.is_complete() {
            StampProgress::Completed
        } else {
            StampProgress::Advanced {
                stamps: self.stamps,
                remaining: self.required - self.stamps,
            }
        }
    }
}
