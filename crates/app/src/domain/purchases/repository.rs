//! Purchases Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use perkwise::{
    history::PurchaseWindow,
    uuids::{CompanyUuid, UserUuid},
};
use sqlx::{Postgres, Transaction, query_as, query_scalar};

use crate::domain::{
    columns::from_bigint,
    purchases::records::{NewPurchase, PurchaseRecord},
};

const CREATE_PURCHASE_SQL: &str = include_str!("sql/create_purchase.sql");
const LIST_PURCHASES_SQL: &str = include_str!("sql/list_purchases.sql");
const COUNT_PURCHASES_SQL: &str = include_str!("sql/count_purchases.sql");
const COUNT_LIFETIME_PURCHASES_SQL: &str = include_str!("sql/count_lifetime_purchases.sql");

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PgPurchasesRepository;

impl PgPurchasesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_purchase(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        user: UserUuid,
        purchase: &NewPurchase,
    ) -> Result<PurchaseRecord, sqlx::Error> {
        query_as::<Postgres, PurchaseRecord>(CREATE_PURCHASE_SQL)
            .bind(purchase.uuid.into_uuid())
            .bind(company.into_uuid())
            .bind(user.into_uuid())
            .bind(purchase.amount)
            .bind(SqlxTimestamp::from(purchase.occurred_at))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_purchases(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        user: UserUuid,
    ) -> Result<Vec<PurchaseRecord>, sqlx::Error> {
        query_as::<Postgres, PurchaseRecord>(LIST_PURCHASES_SQL)
            .bind(company.into_uuid())
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn count_purchases(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        user: UserUuid,
        window: PurchaseWindow,
    ) -> Result<u64, sqlx::Error> {
        let purchases: i64 = query_scalar(COUNT_PURCHASES_SQL)
            .bind(company.into_uuid())
            .bind(user.into_uuid())
            .bind(SqlxTimestamp::from(window.start))
            .bind(window.end.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await?;

        from_bigint(purchases, "purchases")
    }

    pub(crate) async fn count_lifetime_purchases(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let purchases: i64 = query_scalar(COUNT_LIFETIME_PURCHASES_SQL)
            .bind(company.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        from_bigint(purchases, "purchases")
    }
}
