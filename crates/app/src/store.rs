//! Postgres-backed loyalty store.
//!
//! Every engine unit of work is one database transaction. Wallet locks are row locks
//! (`SELECT ... FOR UPDATE`) held until the transaction commits or rolls back.

use async_trait::async_trait;
use jiff::Timestamp;
use perkwise::{
    fees::{FeeSettings, ServiceType},
    history::{HistoryQuery, PurchaseWindow},
    ledger::{Account, Posting, Wallet, WalletLedger},
    rules::{FundsExhausted, StoredRule},
    store::{LoyaltyStore, RuleBook, UnitOfWork},
    uuids::{CompanyUuid, RuleUuid, UserUuid},
};
use sqlx::{Postgres, Transaction};

use crate::{
    database::Db,
    domain::{
        fees::repository::PgFeesRepository, purchases::repository::PgPurchasesRepository,
        rules::repository::PgRulesRepository, wallets::repository::PgWalletsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgLoyaltyStore {
    db: Db,
}

impl PgLoyaltyStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LoyaltyStore for PgLoyaltyStore {
    type Unit = PgUnit;

    async fn begin(&self) -> Result<PgUnit, sqlx::Error> {
        PgUnit::begin(&self.db).await
    }
}

/// One open transaction plus the repositories that run inside it.
#[derive(Debug)]
pub struct PgUnit {
    tx: Transaction<'static, Postgres>,
    rules: PgRulesRepository,
    fees: PgFeesRepository,
    wallets: PgWalletsRepository,
    purchases: PgPurchasesRepository,
}

impl PgUnit {
    pub(crate) async fn begin(db: &Db) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tx: db.begin().await?,
            rules: PgRulesRepository::new(),
            fees: PgFeesRepository::new(),
            wallets: PgWalletsRepository::new(),
            purchases: PgPurchasesRepository::new(),
        })
    }
}

#[async_trait]
impl UnitOfWork for PgUnit {
    type Error = sqlx::Error;

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

#[async_trait]
impl RuleBook for PgUnit {
    async fn active_rules(&mut self, company: CompanyUuid) -> Result<Vec<StoredRule>, sqlx::Error> {
        let records = self.rules.list_active_rules(&mut self.tx, company).await?;

        Ok(records.into_iter().map(StoredRule::from).collect())
    }

    async fn find_rule(
        &mut self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<Option<StoredRule>, sqlx::Error> {
        let record = self.rules.find_rule(&mut self.tx, company, rule).await?;

        Ok(record.map(StoredRule::from))
    }

    async fn deactivate_company_rules(
        &mut self,
        event: &FundsExhausted,
    ) -> Result<u64, sqlx::Error> {
        self.rules
            .deactivate_company_rules(&mut self.tx, event.company)
            .await
    }
}

#[async_trait]
impl FeeSettings for PgUnit {
    async fn fee_setting(
        &mut self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<Option<u64>, sqlx::Error> {
        let setting = self
            .fees
            .get_fee_setting(&mut self.tx, company, service)
            .await?;

        Ok(setting.map(|setting| setting.fee_minor))
    }
}

#[async_trait]
impl HistoryQuery for PgUnit {
    async fn count_purchases(
        &mut self,
        company: CompanyUuid,
        user: UserUuid,
        window: PurchaseWindow,
    ) -> Result<u64, sqlx::Error> {
        self.purchases
            .count_purchases(&mut self.tx, company, user, window)
            .await
    }

    async fn lifetime_purchases(
        &mut self,
        company: CompanyUuid,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        self.purchases
            .count_lifetime_purchases(&mut self.tx, company, user)
            .await
    }

    async fn last_award(
        &mut self,
        user: UserUuid,
        rule: RuleUuid,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        self.wallets.last_award(&mut self.tx, user, rule).await
    }

    async fn award_count(&mut self, user: UserUuid, rule: RuleUuid) -> Result<u64, sqlx::Error> {
        self.wallets.count_awards(&mut self.tx, user, rule).await
    }
}

#[async_trait]
impl WalletLedger for PgUnit {
    async fn lock_wallet(&mut self, account: Account) -> Result<Wallet, sqlx::Error> {
        self.wallets.lock_wallet(&mut self.tx, account).await
    }

    async fn record_posting(&mut self, posting: &Posting) -> Result<(), sqlx::Error> {
        self.wallets.record_posting(&mut self.tx, posting).await?;

        Ok(())
    }
}
