//! Purchases service.

use async_trait::async_trait;
use mockall::automock;
use perkwise::uuids::{CompanyUuid, UserUuid};

use crate::{
    database::Db,
    domain::purchases::{
        errors::PurchasesServiceError,
        records::{NewPurchase, PurchaseRecord},
        repository::PgPurchasesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgPurchasesService {
    db: Db,
    repository: PgPurchasesRepository,
}

impl PgPurchasesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgPurchasesRepository::new(),
        }
    }
}

#[async_trait]
impl PurchasesService for PgPurchasesService {
    #[tracing::instrument(
        name = "purchases.service.record_purchase",
        skip(self, purchase),
        fields(
            company_uuid = %company,
            user_uuid = %user,
            purchase_uuid = %purchase.uuid
        ),
        err
    )]
    async fn record_purchase(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        purchase: NewPurchase,
    ) -> Result<PurchaseRecord, PurchasesServiceError> {
        if purchase.amount.is_sign_negative() {
            return Err(PurchasesServiceError::NegativeAmount);
        }

        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .create_purchase(&mut tx, company, user, &purchase)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_purchases(
        &self,
        company: CompanyUuid,
        user: UserUuid,
    ) -> Result<Vec<PurchaseRecord>, PurchasesServiceError> {
        let mut tx = self.db.begin().await?;

        let purchases = self.repository.list_purchases(&mut tx, company, user).await?;

        tx.commit().await?;

        Ok(purchases)
    }
}

#[automock]
#[async_trait]
pub trait PurchasesService: Send + Sync {
    /// Log a completed purchase so frequency, recurrence and first-purchase rules can see it.
    ///
    /// Purchases must be logged before the event that triggers their evaluation.
    async fn record_purchase(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        purchase: NewPurchase,
    ) -> Result<PurchaseRecord, PurchasesServiceError>;

    /// Purchases of `user` at `company`, oldest first.
    async fn list_purchases(
        &self,
        company: CompanyUuid,
        user: UserUuid,
    ) -> Result<Vec<PurchaseRecord>, PurchasesServiceError>;
}
