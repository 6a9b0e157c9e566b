//! Wallets Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use perkwise::{
    ledger::{Account, Posting, Wallet},
    uuids::{CompanyUuid, RuleUuid, UserUuid},
};
use sqlx::{Postgres, Transaction, query, query_as, query_scalar};

use crate::domain::{
    columns::{from_bigint, to_bigint},
    wallets::records::{TransactionRecord, TransactionUuid},
};

const ENSURE_WALLET_SQL: &str = include_str!("sql/ensure_wallet.sql");
const LOCK_WALLET_SQL: &str = include_str!("sql/lock_wallet.sql");
const GET_BALANCE_SQL: &str = include_str!("sql/get_balance.sql");
const UPDATE_BALANCE_SQL: &str = include_str!("sql/update_balance.sql");
const INSERT_TRANSACTION_SQL: &str = include_str!("sql/insert_transaction.sql");
const LIST_TRANSACTIONS_SQL: &str = include_str!("sql/list_transactions.sql");
const LEDGER_TOTAL_SQL: &str = include_str!("sql/ledger_total.sql");
const LAST_AWARD_SQL: &str = include_str!("sql/last_award.sql");
const COUNT_AWARDS_SQL: &str = include_str!("sql/count_awards.sql");

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PgWalletsRepository;

impl PgWalletsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Create the wallet at zero if missing, then take its row lock for the rest of `tx`.
    pub(crate) async fn lock_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account: Account,
    ) -> Result<Wallet, sqlx::Error> {
        query(ENSURE_WALLET_SQL)
            .bind(account.kind().as_str())
            .bind(account.owner())
            .execute(&mut **tx)
            .await?;

        let balance: i64 = query_scalar(LOCK_WALLET_SQL)
            .bind(account.kind().as_str())
            .bind(account.owner())
            .fetch_one(&mut **tx)
            .await?;

        Ok(Wallet {
            account,
            balance: from_bigint(balance, "balance")?,
        })
    }

    /// Balance without locking; wallets never posted to read as zero.
    pub(crate) async fn balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account: Account,
    ) -> Result<u64, sqlx::Error> {
        let balance: Option<i64> = query_scalar(GET_BALANCE_SQL)
            .bind(account.kind().as_str())
            .bind(account.owner())
            .fetch_optional(&mut **tx)
            .await?;

        balance.map_or(Ok(0), |balance| from_bigint(balance, "balance"))
    }

    /// Append `posting` and move the wallet balance to its `balance_after`.
    pub(crate) async fn record_posting(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        posting: &Posting,
    ) -> Result<TransactionUuid, sqlx::Error> {
        let uuid = TransactionUuid::new();
        let balance_after = to_bigint(posting.balance_after)?;

        query(INSERT_TRANSACTION_SQL)
            .bind(uuid.into_uuid())
            .bind(posting.account.kind().as_str())
            .bind(posting.account.owner())
            .bind(posting.kind.as_str())
            .bind(posting.amount)
            .bind(balance_after)
            .bind(&posting.memo)
            .bind(posting.rule.map(RuleUuid::into_uuid))
            .bind(posting.company.map(CompanyUuid::into_uuid))
            .bind(SqlxTimestamp::from(posting.occurred_at))
            .execute(&mut **tx)
            .await?;

        query(UPDATE_BALANCE_SQL)
            .bind(posting.account.kind().as_str())
            .bind(posting.account.owner())
            .bind(balance_after)
            .execute(&mut **tx)
            .await?;

        Ok(uuid)
    }

    pub(crate) async fn list_transactions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account: Account,
    ) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        query_as::<Postgres, TransactionRecord>(LIST_TRANSACTIONS_SQL)
            .bind(account.kind().as_str())
            .bind(account.owner())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn ledger_total(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account: Account,
    ) -> Result<i64, sqlx::Error> {
        query_scalar(LEDGER_TOTAL_SQL)
            .bind(account.kind().as_str())
            .bind(account.owner())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn last_award(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        rule: RuleUuid,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let last_award: Option<SqlxTimestamp> = query_scalar(LAST_AWARD_SQL)
            .bind(user.into_uuid())
            .bind(rule.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(last_award.map(SqlxTimestamp::to_jiff))
    }

    pub(crate) async fn count_awards(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        rule: RuleUuid,
    ) -> Result<u64, sqlx::Error> {
        let awards: i64 = query_scalar(COUNT_AWARDS_SQL)
            .bind(user.into_uuid())
            .bind(rule.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        from_bigint(awards, "awards")
    }
}
