//! Wallets service.
//!
//! Manual wallet movements: company top-ups, user redemptions and corrections. Every movement
//! goes through the same locked posting path the engine uses for awards.

use async_trait::async_trait;
use mockall::automock;
use perkwise::{
    ledger::{self, Account, Entry, Posting},
    store::UnitOfWork,
    uuids::{CompanyUuid, UserUuid},
};
use tracing::info;

use crate::{
    database::Db,
    domain::wallets::{
        errors::WalletsServiceError,
        records::{Reconciliation, TransactionRecord},
        repository::PgWalletsRepository,
    },
    store::PgUnit,
};

#[derive(Debug, Clone)]
pub struct PgWalletsService {
    db: Db,
    repository: PgWalletsRepository,
}

impl PgWalletsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgWalletsRepository::new(),
        }
    }

    async fn post(&self, account: Account, entry: Entry) -> Result<Posting, WalletsServiceError> {
        let mut unit = PgUnit::begin(&self.db).await?;

        let posting = ledger::post(&mut unit, account, entry).await?;

        unit.commit().await?;

        info!(
            account_kind = %account.kind(),
            owner_uuid = %account.owner(),
            kind = %posting.kind,
            amount = posting.amount,
            balance_after = posting.balance_after,
            "wallet posting recorded"
        );

        Ok(posting)
    }
}

#[async_trait]
impl WalletsService for PgWalletsService {
    #[tracing::instrument(
        name = "wallets.service.fund_fees",
        skip(self, memo),
        fields(company_uuid = %company),
        err
    )]
    async fn fund_fees(
        &self,
        company: CompanyUuid,
        amount_minor: u64,
        memo: String,
    ) -> Result<Posting, WalletsServiceError> {
        self.post(Account::CompanyFees(company), Entry::credit(amount_minor, memo))
            .await
    }

    #[tracing::instrument(
        name = "wallets.service.fund_points",
        skip(self, memo),
        fields(company_uuid = %company),
        err
    )]
    async fn fund_points(
        &self,
        company: CompanyUuid,
        points: u64,
        memo: String,
    ) -> Result<Posting, WalletsServiceError> {
        self.post(Account::CompanyPoints(company), Entry::credit(points, memo))
            .await
    }

    #[tracing::instrument(
        name = "wallets.service.redeem",
        skip(self, memo),
        fields(user_uuid = %user),
        err
    )]
    async fn redeem(
        &self,
        user: UserUuid,
        points: u64,
        company: Option<CompanyUuid>,
        memo: String,
    ) -> Result<Posting, WalletsServiceError> {
        self.post(Account::UserPoints(user), Entry::redeem(points, company, memo))
            .await
    }

    #[tracing::instrument(
        name = "wallets.service.adjust",
        skip(self, memo),
        fields(user_uuid = %user),
        err
    )]
    async fn adjust(
        &self,
        user: UserUuid,
        delta: i64,
        memo: String,
    ) -> Result<Posting, WalletsServiceError> {
        self.post(Account::UserPoints(user), Entry::adjustment(delta, memo))
            .await
    }

    async fn balance(&self, account: Account) -> Result<u64, WalletsServiceError> {
        let mut tx = self.db.begin().await?;

        let balance = self.repository.balance(&mut tx, account).await?;

        tx.commit().await?;

        Ok(balance)
    }

    async fn transactions(
        &self,
        account: Account,
    ) -> Result<Vec<TransactionRecord>, WalletsServiceError> {
        let mut tx = self.db.begin().await?;

        let transactions = self.repository.list_transactions(&mut tx, account).await?;

        tx.commit().await?;

        Ok(transactions)
    }

    async fn reconcile(&self, account: Account) -> Result<Reconciliation, WalletsServiceError> {
        let mut tx = self.db.begin().await?;

        let balance = self.repository.balance(&mut tx, account).await?;
        let ledger_total = self.repository.ledger_total(&mut tx, account).await?;

        tx.commit().await?;

        Ok(Reconciliation {
            account,
            balance,
            ledger_total,
        })
    }
}

#[automock]
#[async_trait]
pub trait WalletsService: Send + Sync {
    /// Top up a company's fee wallet, in minor currency units.
    async fn fund_fees(
        &self,
        company: CompanyUuid,
        amount_minor: u64,
        memo: String,
    ) -> Result<Posting, WalletsServiceError>;

    /// Top up a company's points reserve.
    async fn fund_points(
        &self,
        company: CompanyUuid,
        points: u64,
        memo: String,
    ) -> Result<Posting, WalletsServiceError>;

    /// Spend user points, optionally attributed to the company they were spent at.
    async fn redeem(
        &self,
        user: UserUuid,
        points: u64,
        company: Option<CompanyUuid>,
        memo: String,
    ) -> Result<Posting, WalletsServiceError>;

    /// Correct a user balance in either direction.
    async fn adjust(
        &self,
        user: UserUuid,
        delta: i64,
        memo: String,
    ) -> Result<Posting, WalletsServiceError>;

    async fn balance(&self, account: Account) -> Result<u64, WalletsServiceError>;

    /// Postings of `account`, oldest first.
    async fn transactions(
        &self,
        account: Account,
    ) -> Result<Vec<TransactionRecord>, WalletsServiceError>;

    /// Compare the stored balance with the signed sum of the account's postings.
    async fn reconcile(&self, account: Account) -> Result<Reconciliation, WalletsServiceError>;
}
