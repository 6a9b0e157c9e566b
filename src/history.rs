//! History Query
//!
//! Read-only questions the matcher needs answered about the past: purchases in a window,
//! lifetime purchases, and the award trail of a rule for a user. The store answers the raw
//! counts; [`HistoryFacts::gather`] decides which ones a given rule needs so the matcher itself
//! stays a pure function.

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use smallvec::SmallVec;

use crate::{
    rules::{Rule, RuleConfig},
    store::UnitOfWork,
    uuids::{CompanyUuid, RuleUuid, UserUuid},
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Half-open purchase window `[start, end)`; an open end includes everything from `start` on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseWindow {
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

impl PurchaseWindow {
    /// The trailing window of `days` days ending at (and including) `as_of`.
    #[must_use]
    pub fn trailing(as_of: Timestamp, days: u32) -> Self {
        Self {
            start: days_before(as_of, i64::from(days)),
            end: None,
        }
    }

    /// The `index`-th period of `period_days` days counting back from `as_of`.
    ///
    /// Period `0` is open-ended so the purchase being evaluated is always counted.
    #[must_use]
    pub fn period(as_of: Timestamp, period_days: u32, index: u32) -> Self {
        let period_days = i64::from(period_days);
        let index = i64::from(index);

        Self {
            start: days_before(as_of, period_days.saturating_mul(index + 1)),
            end: (index > 0).then(|| days_before(as_of, period_days.saturating_mul(index))),
        }
    }

    #[must_use]
    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && self.end.is_none_or(|end| at < end)
    }
}

/// `as_of` minus whole days, clamped to the earliest representable instant.
pub(crate) fn days_before(as_of: Timestamp, days: i64) -> Timestamp {
    let duration = SignedDuration::from_secs(days.saturating_mul(SECONDS_PER_DAY));

    as_of.checked_sub(duration).unwrap_or(Timestamp::MIN)
}

/// Read access to the purchase log and the user award trail.
#[async_trait]
pub trait HistoryQuery: UnitOfWork {
    /// Purchases by `user` at `company` inside `window`.
    async fn count_purchases(
        &mut self,
        company: CompanyUuid,
        user: UserUuid,
        window: PurchaseWindow,
    ) -> Result<u64, Self::Error>;

    /// All purchases ever logged for `user` at `company`.
    async fn lifetime_purchases(
        &mut self,
        company: CompanyUuid,
        user: UserUuid,
    ) -> Result<u64, Self::Error>;

    /// Time of the most recent award of `rule` to `user`.
    async fn last_award(
        &mut self,
        user: UserUuid,
        rule: RuleUuid,
    ) -> Result<Option<Timestamp>, Self::Error>;

    /// Number of awards of `rule` to `user`.
    async fn award_count(&mut self, user: UserUuid, rule: RuleUuid) -> Result<u64, Self::Error>;
}

/// The slice of history a single rule evaluation depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFacts {
    /// Most recent award of the rule to the user (cooldown).
    pub last_award: Option<Timestamp>,

    /// Awards of the rule to the user (attribution caps).
    pub award_count: u64,

    /// Purchases in the rule's trailing window (frequency).
    pub trailing_purchases: u64,

    /// Purchases per streak period, newest first (recurrence).
    pub period_purchases: SmallVec<[u64; 4]>,

    /// Lifetime purchases (first-purchase detection).
    pub lifetime_purchases: u64,
}

impl HistoryFacts {
    /// Query only the facts `rule` depends on.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn gather<H: HistoryQuery + ?Sized>(
        history: &mut H,
        rule: &Rule,
        company: CompanyUuid,
        user: UserUuid,
        as_of: Timestamp,
    ) -> Result<Self, H::Error> {
        let mut facts = Self::default();

        if rule.cooldown_days > 0 {
            facts.last_award = history.last_award(user, rule.uuid).await?;
        }

        match &rule.config {
            RuleConfig::Frequency(frequency) => {
                let window = PurchaseWindow::trailing(as_of, frequency.window_days);

                facts.trailing_purchases = history.count_purchases(company, user, window).await?;
            }
            RuleConfig::Recurrence(recurrence) => {
                for index in 0..recurrence.consecutive_periods {
                    let window = PurchaseWindow::period(as_of, recurrence.period_days, index);
                    let count = history.count_purchases(company, user, window).await?;

                    facts.period_purchases.push(count);

                    if count < recurrence.threshold_per_period {
                        break;
                    }
                }
            }
            RuleConfig::FirstPurchase(_) => {
                facts.lifetime_purchases = history.lifetime_purchases(company, user).await?;
            }
            RuleConfig::DigitalBehavior(digital) if digital.max_per_user.is_some() => {
                facts.award_count = history.award_count(user, rule.uuid).await?;
            }
            _ => {}
        }

        Ok(facts)
    }

    /// Whether the cooldown since the last award has elapsed at `as_of`.
    #[must_use]
    pub fn cooldown_elapsed(&self, cooldown_days: u32, as_of: Timestamp) -> bool {
        if cooldown_days == 0 {
            return true;
        }

        self.last_award
            .is_none_or(|last| last <= days_before(as_of, i64::from(cooldown_days)))
    }
}
