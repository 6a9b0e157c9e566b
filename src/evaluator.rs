//! Two-Phase Evaluator
//!
//! Runs every active rule of a company against one event. Additive rules run first, in
//! declaration order, against a payload without `base_points`. Their funded total becomes
//! `base_points` for the multiplicative pass, so multipliers never see each other's output.
//!
//! Each matched rule is paid for by the funding protocol:
//!
//! 1. lock the user wallet, re-check the rule is still active, gather history, match;
//! 2. resolve the fee and lock the company fee wallet; if it cannot cover the fee, raise
//!    [`FundsExhausted`] (every company rule goes inactive) and contribute nothing;
//! 3. debit the fee;
//! 4. debit the points from the company points reserve; an insufficient reserve raises
//!    [`FundsExhausted`] as well;
//! 5. credit the user with an `award` posting that names the rule.
//!
//! Steps 1 to 5 run in one unit of work, so the user wallet stays locked from the match to the
//! award. When the reservation fails that unit is rolled back; under [`FeeSettlement::Sunk`]
//! the fee is then charged in the same unit that deactivates the company's rules.
//!
//! Lock order is always user wallet, fee wallet, points wallet.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Span, debug, error, info, warn};

use crate::{
    fees::{FeePolicy, FeeSettings, ServiceType},
    history::HistoryFacts,
    ledger::{self, Account, AccountKind, Entry, LedgerError, PostingError, WalletLedger},
    matcher,
    payload::EventPayload,
    rules::{FundsExhausted, Phase, Rule, StoredRule},
    store::{LoyaltyStore, RuleBook, UnitOfWork},
    uuids::{CompanyUuid, RuleUuid, UserUuid},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced to callers. Business-level non-matches and funding exhaustion are not errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rule does not exist or belongs to another company.
    #[error("rule {0} not found")]
    RuleNotFound(RuleUuid),

    /// The store failed; the event should be retried or failed by the caller.
    #[error("storage error")]
    Store(#[source] BoxError),
}

impl EngineError {
    fn store<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Store(Box::new(error))
    }
}

/// What happens to the fee when the points reservation fails after it was charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSettlement {
    /// A matched rule is charged its fee even if the points reservation fails.
    #[default]
    Sunk,

    /// The fee is only charged when the points are awarded.
    Atomic,
}

impl Display for FeeSettlement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Sunk => "sunk",
            Self::Atomic => "atomic",
        })
    }
}

/// A settlement name other than `sunk` or `atomic`.
#[derive(Debug, Error)]
#[error("unknown fee settlement `{0}`, expected `sunk` or `atomic`")]
pub struct UnknownFeeSettlement(pub String);

impl FromStr for FeeSettlement {
    type Err = UnknownFeeSettlement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunk" => Ok(Self::Sunk),
            "atomic" => Ok(Self::Atomic),
            other => Err(UnknownFeeSettlement(other.to_string())),
        }
    }
}

/// Engine settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fee charged per funded rule when a company has no explicit setting.
    pub fees: FeePolicy,

    /// Whether a failed reservation keeps the fee.
    pub settlement: FeeSettlement,
}

/// One funded rule in an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAward {
    /// The rule that fired.
    pub rule_id: RuleUuid,

    /// Points credited to the user for it.
    pub points: u64,
}

/// Result of evaluating every rule for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Always the sum of `breakdown`.
    pub total_points: u64,

    /// Funded rules in evaluation order: additive rules first, then multiplicative rules.
    pub breakdown: Vec<RuleAward>,
}

impl Evaluation {
    fn record(&mut self, rule_id: RuleUuid, points: u64) {
        self.total_points = self.total_points.saturating_add(points);
        self.breakdown.push(RuleAward { rule_id, points });
    }
}

/// Result of running one rule through matching and funding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    NoMatch,
    Awarded(u64),
    FundsExhausted,
    Aborted,
}

/// Points rule evaluation engine.
#[derive(Debug, Clone)]
pub struct Engine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: LoyaltyStore> Engine<S> {
    /// Build an engine over `store`.
    #[must_use]
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The settings this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate every active rule of `company` for `user` and award the points.
    ///
    /// Stops early when a rule's funding fails, since every company rule is inactive afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on infrastructure failure; the caller should fail the
    /// originating business event. Awards already committed for earlier rules stay committed.
    #[tracing::instrument(
        name = "engine.evaluate_all_rules",
        skip(self, payload),
        fields(
            company_uuid = %company,
            user_uuid = %user,
            rule_count = tracing::field::Empty,
            total_points = tracing::field::Empty
        ),
        err
    )]
    pub async fn evaluate_all_rules(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        payload: &EventPayload,
    ) -> Result<Evaluation, EngineError> {
        let rules = self.load_active_rules(company).await?;

        let span = Span::current();

        span.record("rule_count", rules.len());

        let (additive, multiplicative): (Vec<_>, Vec<_>) = rules
            .iter()
            .partition(|rule| rule.phase() == Phase::Additive);

        let mut evaluation = Evaluation::default();

        let additive_payload = payload.without_base_points();

        for rule in additive {
            match self.award(company, user, rule, &additive_payload).await? {
                Outcome::Awarded(points) => evaluation.record(rule.uuid, points),
                Outcome::FundsExhausted => return Ok(finish(evaluation)),
                Outcome::NoMatch | Outcome::Aborted => {}
            }
        }

        let multiplicative_payload = payload.with_base_points(evaluation.total_points);

        for rule in multiplicative {
            match self.award(company, user, rule, &multiplicative_payload).await? {
                Outcome::Awarded(points) => evaluation.record(rule.uuid, points),
                Outcome::FundsExhausted => return Ok(finish(evaluation)),
                Outcome::NoMatch | Outcome::Aborted => {}
            }
        }

        Ok(finish(evaluation))
    }

    /// Evaluate a single rule outside the two-phase batch.
    ///
    /// Additive rules never see `base_points`; multiplicative rules use whatever
    /// `base_points` the caller supplies (none means nothing to multiply).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RuleNotFound`] when the rule does not belong to `company`, and
    /// [`EngineError::Store`] on infrastructure failure.
    #[tracing::instrument(
        name = "engine.evaluate_single_rule",
        skip(self, payload),
        fields(company_uuid = %company, user_uuid = %user, rule_uuid = %rule),
        err
    )]
    pub async fn evaluate_single_rule(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        rule: RuleUuid,
        payload: &EventPayload,
    ) -> Result<u64, EngineError> {
        let stored = {
            let mut unit = self.begin().await?;
            let stored = unit
                .find_rule(company, rule)
                .await
                .map_err(EngineError::store)?;

            unit.commit().await.map_err(EngineError::store)?;

            stored.ok_or(EngineError::RuleNotFound(rule))?
        };

        let Some(rule) = parse_rule(&stored) else {
            return Ok(0);
        };

        if !rule.active {
            debug!(rule_uuid = %rule.uuid, "rule is inactive");

            return Ok(0);
        }

        let payload = match rule.phase() {
            Phase::Additive => payload.without_base_points(),
            Phase::Multiplicative => payload.clone(),
        };

        match self.award(company, user, &rule, &payload).await? {
            Outcome::Awarded(points) => Ok(points),
            Outcome::NoMatch | Outcome::FundsExhausted | Outcome::Aborted => Ok(0),
        }
    }

    async fn begin(&self) -> Result<S::Unit, EngineError> {
        self.store.begin().await.map_err(EngineError::store)
    }

    async fn load_active_rules(&self, company: CompanyUuid) -> Result<Vec<Rule>, EngineError> {
        let mut unit = self.begin().await?;

        let stored = unit
            .active_rules(company)
            .await
            .map_err(EngineError::store)?;

        unit.commit().await.map_err(EngineError::store)?;

        Ok(stored
            .iter()
            .filter_map(parse_rule)
            .filter(|rule| rule.active)
            .collect())
    }

    /// Match one rule and, if it fires, run the funding protocol.
    async fn award(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        rule: &Rule,
        payload: &EventPayload,
    ) -> Result<Outcome, EngineError> {
        let mut unit = self.begin().await?;

        // Held until the award commits: concurrent evaluations for this user queue here, so
        // cooldowns and caps always see prior awards.
        unit.lock_wallet(Account::UserPoints(user))
            .await
            .map_err(EngineError::store)?;

        let current = unit
            .find_rule(company, rule.uuid)
            .await
            .map_err(EngineError::store)?;

        if !current.is_some_and(|stored| stored.active) {
            unit.rollback().await.map_err(EngineError::store)?;

            debug!(rule_uuid = %rule.uuid, "rule went inactive before funding");

            return Ok(Outcome::NoMatch);
        }

        let facts = HistoryFacts::gather(&mut unit, rule, company, user, payload.occurred_at)
            .await
            .map_err(EngineError::store)?;

        let points = matcher::points(rule, payload, &facts);

        if points == 0 {
            unit.rollback().await.map_err(EngineError::store)?;

            return Ok(Outcome::NoMatch);
        }

        let setting = unit
            .fee_setting(company, ServiceType::Points)
            .await
            .map_err(EngineError::store)?;

        let fee = self.config.fees.resolve(setting);

        let fee_wallet = unit
            .lock_wallet(Account::CompanyFees(company))
            .await
            .map_err(EngineError::store)?;

        if fee_wallet.balance < fee {
            let event = FundsExhausted {
                company,
                rule: rule.uuid,
                account: AccountKind::CompanyFees,
                required: fee,
                available: fee_wallet.balance,
            };

            self.exhaust(unit, &event).await?;

            return Ok(Outcome::FundsExhausted);
        }

        if fee > 0 {
            let entry = Entry::debit(fee, format!("fee: {}", rule.name)).at(payload.occurred_at);

            match ledger::post(&mut unit, Account::CompanyFees(company), entry).await {
                Ok(_) => {}
                Err(PostingError::Store(error)) => return Err(EngineError::store(error)),
                Err(PostingError::Rejected(error)) => return abort(unit, rule, &error).await,
            }
        }

        let reservation =
            Entry::debit(points, format!("reserve: {}", rule.name)).at(payload.occurred_at);

        match ledger::post(&mut unit, Account::CompanyPoints(company), reservation).await {
            Ok(_) => {}
            Err(PostingError::Rejected(LedgerError::InsufficientBalance {
                available,
                requested,
                ..
            })) => {
                unit.rollback().await.map_err(EngineError::store)?;

                let event = FundsExhausted {
                    company,
                    rule: rule.uuid,
                    account: AccountKind::CompanyPoints,
                    required: requested,
                    available,
                };

                let mut unit = self.begin().await?;

                if self.config.settlement == FeeSettlement::Sunk && fee > 0 {
                    sink_fee(&mut unit, rule, fee, payload).await?;
                }

                self.exhaust(unit, &event).await?;

                return Ok(Outcome::FundsExhausted);
            }
            Err(PostingError::Rejected(error)) => return abort(unit, rule, &error).await,
            Err(PostingError::Store(error)) => return Err(EngineError::store(error)),
        }

        let award = Entry::award(points, company, rule.uuid, rule.name.clone()).at(payload.occurred_at);

        match ledger::post(&mut unit, Account::UserPoints(user), award).await {
            Ok(_) => {}
            Err(PostingError::Rejected(error)) => return abort(unit, rule, &error).await,
            Err(PostingError::Store(error)) => return Err(EngineError::store(error)),
        }

        unit.commit().await.map_err(EngineError::store)?;

        info!(
            rule_uuid = %rule.uuid,
            rule_type = %rule.config.rule_type(),
            points,
            fee,
            "awarded points"
        );

        Ok(Outcome::Awarded(points))
    }

    /// Deactivate every rule of the company inside `unit` and commit it.
    async fn exhaust(&self, mut unit: S::Unit, event: &FundsExhausted) -> Result<(), EngineError> {
        let deactivated = unit
            .deactivate_company_rules(event)
            .await
            .map_err(EngineError::store)?;

        unit.commit().await.map_err(EngineError::store)?;

        warn!(
            company_uuid = %event.company,
            rule_uuid = %event.rule,
            account = %event.account,
            required = event.required,
            available = event.available,
            deactivated,
            "funds exhausted, company rules deactivated"
        );

        Ok(())
    }
}

fn finish(evaluation: Evaluation) -> Evaluation {
    Span::current().record("total_points", evaluation.total_points);

    evaluation
}

fn parse_rule(stored: &StoredRule) -> Option<Rule> {
    match stored.parse() {
        Ok(rule) => Some(rule),
        Err(error) => {
            warn!(
                rule_uuid = %stored.uuid,
                rule_type = %stored.rule_type,
                error = %error,
                "skipping rule with unusable config"
            );

            None
        }
    }
}

/// Charge the fee of a rule whose points reservation failed.
///
/// A fee wallet drained since the match is left alone; the rule is still deactivated.
async fn sink_fee<L: WalletLedger>(
    unit: &mut L,
    rule: &Rule,
    fee: u64,
    payload: &EventPayload,
) -> Result<(), EngineError> {
    let entry = Entry::debit(fee, format!("fee: {}", rule.name)).at(payload.occurred_at);

    match ledger::post(unit, Account::CompanyFees(rule.company), entry).await {
        Ok(_) => Ok(()),
        Err(PostingError::Rejected(error)) => {
            warn!(rule_uuid = %rule.uuid, error = %error, "sunk fee not charged");

            Ok(())
        }
        Err(PostingError::Store(error)) => Err(EngineError::store(error)),
    }
}

/// Roll back a rule whose postings broke a ledger invariant; the user is not credited.
async fn abort<U: UnitOfWork>(
    unit: U,
    rule: &Rule,
    error: &LedgerError,
) -> Result<Outcome, EngineError> {
    unit.rollback().await.map_err(EngineError::store)?;

    error!(
        rule_uuid = %rule.uuid,
        error = %error,
        "aborted award after ledger rejection"
    );

    Ok(Outcome::Aborted)
}
