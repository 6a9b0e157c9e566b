//! Store Boundary
//!
//! The engine never talks to a database directly. Every read and write goes through a unit of
//! work handed out by a [`LoyaltyStore`]; nothing is visible to other units until
//! [`UnitOfWork::commit`], and dropping or rolling back a unit discards its writes.

use async_trait::async_trait;

use crate::{
    fees::FeeSettings,
    history::HistoryQuery,
    ledger::WalletLedger,
    rules::{FundsExhausted, StoredRule},
    uuids::{CompanyUuid, RuleUuid},
};

/// A transaction boundary.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Infrastructure failure (storage unavailable, constraint violation, ...).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Make every write of this unit durable.
    async fn commit(self) -> Result<(), Self::Error>;

    /// Discard every write of this unit.
    async fn rollback(self) -> Result<(), Self::Error>;
}

/// Rule storage as seen by the engine.
#[async_trait]
pub trait RuleBook: UnitOfWork {
    /// Active rules of `company`, in declaration order.
    async fn active_rules(&mut self, company: CompanyUuid) -> Result<Vec<StoredRule>, Self::Error>;

    /// A single rule of `company`, active or not.
    async fn find_rule(
        &mut self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<Option<StoredRule>, Self::Error>;

    /// Deactivate every active rule named by the event's company; returns how many changed.
    async fn deactivate_company_rules(&mut self, event: &FundsExhausted)
    -> Result<u64, Self::Error>;
}

/// Everything a single rule evaluation touches.
pub trait LoyaltyUnit: RuleBook + FeeSettings + HistoryQuery + WalletLedger {}

impl<T> LoyaltyUnit for T where T: RuleBook + FeeSettings + HistoryQuery + WalletLedger {}

/// Source of units of work.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    type Unit: LoyaltyUnit;

    /// Open a new unit of work.
    async fn begin(&self) -> Result<Self::Unit, <Self::Unit as UnitOfWork>::Error>;
}
