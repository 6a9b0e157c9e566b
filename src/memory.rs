//! In-Memory Store
//!
//! A [`LoyaltyStore`] backed by process memory. A unit of work holds the store's mutex for its
//! whole lifetime and works on a private copy of the state, so units are fully serialised and
//! a dropped or rolled-back unit leaves no trace.

use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    fees::{FeeSettings, ServiceType},
    history::{HistoryQuery, PurchaseWindow},
    ledger::{self, Account, Entry, LedgerError, Posting, PostingError, PostingKind, Wallet, WalletLedger},
    rules::{FundsExhausted, NewRule, RuleConfigError, StoredRule},
    store::{LoyaltyStore, RuleBook, UnitOfWork},
    uuids::{CompanyUuid, RuleUuid, UserUuid},
};

/// A logged purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub company: CompanyUuid,
    pub user: UserUuid,
    pub amount: Decimal,
    pub occurred_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    rules: Vec<StoredRule>,
    fees: FxHashMap<(CompanyUuid, ServiceType), u64>,
    balances: FxHashMap<Account, u64>,
    postings: Vec<Posting>,
    purchases: Vec<Purchase>,
}

/// Shared in-memory store; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

/// Unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn unit(&self) -> MemoryUnit {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();

        MemoryUnit { guard, working }
    }

    /// Validate and append a rule for `company`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError`] when the rule's config is invalid; nothing is written.
    pub async fn insert_rule(
        &self,
        company: CompanyUuid,
        rule: &NewRule,
    ) -> Result<RuleUuid, RuleConfigError> {
        let stored = rule.to_stored(company)?;
        let uuid = stored.uuid;

        self.insert_stored_rule(stored).await;

        Ok(uuid)
    }

    /// Append a rule as-is, without validating its config.
    pub async fn insert_stored_rule(&self, rule: StoredRule) {
        self.state.lock().await.rules.push(rule);
    }

    /// Activate or deactivate a rule; returns whether the rule exists.
    pub async fn set_rule_active(&self, rule: RuleUuid, active: bool) -> bool {
        let mut state = self.state.lock().await;

        let Some(stored) = state.rules.iter_mut().find(|stored| stored.uuid == rule) else {
            return false;
        };

        if active {
            stored.activate();
        } else {
            stored.deactivate();
        }

        true
    }

    /// Rules of `company` in declaration order, active or not.
    pub async fn rules(&self, company: CompanyUuid) -> Vec<StoredRule> {
        self.state
            .lock()
            .await
            .rules
            .iter()
            .filter(|rule| rule.company == company)
            .cloned()
            .collect()
    }

    /// Set (`Some`) or clear (`None`) the fee for `(company, service)`.
    pub async fn set_fee(&self, company: CompanyUuid, service: ServiceType, fee: Option<u64>) {
        let mut state = self.state.lock().await;

        match fee {
            Some(fee) => {
                state.fees.insert((company, service), fee);
            }
            None => {
                state.fees.remove(&(company, service));
            }
        }
    }

    /// Apply a single entry to `account` in its own unit of work.
    ///
    /// # Errors
    ///
    /// Returns the [`LedgerError`] rejecting the entry; nothing is written.
    pub async fn post(&self, account: Account, entry: Entry) -> Result<Posting, LedgerError> {
        let mut unit = self.unit().await;

        let posting = ledger::post(&mut unit, account, entry)
            .await
            .map_err(|error| match error {
                PostingError::Rejected(error) => error,
                PostingError::Store(never) => match never {},
            })?;

        unit.apply();

        Ok(posting)
    }

    /// Top up a company wallet.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when `account` is not a company wallet or `amount` is zero.
    pub async fn fund(&self, account: Account, amount: u64) -> Result<Posting, LedgerError> {
        self.post(account, Entry::credit(amount, "top-up")).await
    }

    /// Append to the purchase log.
    pub async fn record_purchase(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        amount: Decimal,
        occurred_at: Timestamp,
    ) {
        self.state.lock().await.purchases.push(Purchase {
            company,
            user,
            amount,
            occurred_at,
        });
    }

    pub async fn balance(&self, account: Account) -> u64 {
        self.state
            .lock()
            .await
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    /// Postings of `account`, oldest first.
    pub async fn postings(&self, account: Account) -> Vec<Posting> {
        self.state
            .lock()
            .await
            .postings
            .iter()
            .filter(|posting| posting.account == account)
            .cloned()
            .collect()
    }

    /// Whether the balance of `account` equals the signed sum of its postings.
    pub async fn reconciles(&self, account: Account) -> bool {
        let state = self.state.lock().await;

        let postings: Vec<_> = state
            .postings
            .iter()
            .filter(|posting| posting.account == account)
            .cloned()
            .collect();

        ledger::reconciles(
            state.balances.get(&account).copied().unwrap_or_default(),
            &postings,
        )
    }
}

impl MemoryUnit {
    fn apply(mut self) {
        *self.guard = self.working;
    }

    fn awards(&self, user: UserUuid, rule: RuleUuid) -> impl Iterator<Item = &Posting> {
        self.working.postings.iter().filter(move |posting| {
            posting.account == Account::UserPoints(user)
                && posting.kind == PostingKind::Award
                && posting.rule == Some(rule)
        })
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    type Error = Infallible;

    async fn commit(self) -> Result<(), Self::Error> {
        self.apply();

        Ok(())
    }

    async fn rollback(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[async_trait]
impl RuleBook for MemoryUnit {
    async fn active_rules(&mut self, company: CompanyUuid) -> Result<Vec<StoredRule>, Self::Error> {
        Ok(self
            .working
            .rules
            .iter()
            .filter(|rule| rule.company == company && rule.active)
            .cloned()
            .collect())
    }

    async fn find_rule(
        &mut self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<Option<StoredRule>, Self::Error> {
        Ok(self
            .working
            .rules
            .iter()
            .find(|stored| stored.company == company && stored.uuid == rule)
            .cloned())
    }

    async fn deactivate_company_rules(
        &mut self,
        event: &FundsExhausted,
    ) -> Result<u64, Self::Error> {
        let mut changed = 0;

        for rule in &mut self.working.rules {
            if rule.apply_funds_exhausted(event) {
                changed += 1;
            }
        }

        Ok(changed)
    }
}

#[async_trait]
impl FeeSettings for MemoryUnit {
    async fn fee_setting(
        &mut self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<Option<u64>, Self::Error> {
        Ok(self.working.fees.get(&(company, service)).copied())
    }
}

#[async_trait]
impl HistoryQuery for MemoryUnit {
    async fn count_purchases(
        &mut self,
        company: CompanyUuid,
        user: UserUuid,
        window: PurchaseWindow,
    ) -> Result<u64, Self::Error> {
        Ok(self
            .working
            .purchases
            .iter()
            .filter(|purchase| {
                purchase.company == company
                    && purchase.user == user
                    && window.contains(purchase.occurred_at)
            })
            .count() as u64)
    }

    async fn lifetime_purchases(
        &mut self,
        company: CompanyUuid,
        user: UserUuid,
    ) -> Result<u64, Self::Error> {
        Ok(self
            .working
            .purchases
            .iter()
            .filter(|purchase| purchase.company == company && purchase.user == user)
            .count() as u64)
    }

    async fn last_award(
        &mut self,
        user: UserUuid,
        rule: RuleUuid,
    ) -> Result<Option<Timestamp>, Self::Error> {
        Ok(self
            .awards(user, rule)
            .map(|posting| posting.occurred_at)
            .max())
    }

    async fn award_count(&mut self, user: UserUuid, rule: RuleUuid) -> Result<u64, Self::Error> {
        Ok(self.awards(user, rule).count() as u64)
    }
}

#[async_trait]
impl WalletLedger for MemoryUnit {
    async fn lock_wallet(&mut self, account: Account) -> Result<Wallet, Self::Error> {
        let balance = *self.working.balances.entry(account).or_default();

        Ok(Wallet { account, balance })
    }

    async fn record_posting(&mut self, posting: &Posting) -> Result<(), Self::Error> {
        self.working
            .balances
            .insert(posting.account, posting.balance_after);
        self.working.postings.push(posting.clone());

        Ok(())
    }
}

#[async_trait]
impl LoyaltyStore for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<Self::Unit, Infallible> {
        Ok(self.unit().await)
    }
}
