//! Fees service.

use async_trait::async_trait;
use mockall::automock;
use perkwise::{
    fees::{FeePolicy, ServiceType},
    uuids::CompanyUuid,
};
use tracing::info;

use crate::{
    database::Db,
    domain::fees::{
        errors::FeesServiceError, records::FeeSettingRecord, repository::PgFeesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgFeesService {
    db: Db,
    repository: PgFeesRepository,
    policy: FeePolicy,
}

impl PgFeesService {
    #[must_use]
    pub fn new(db: Db, policy: FeePolicy) -> Self {
        Self {
            db,
            repository: PgFeesRepository::new(),
            policy,
        }
    }
}

#[async_trait]
impl FeesService for PgFeesService {
    #[tracing::instrument(
        name = "fees.service.set_fee",
        skip(self),
        fields(company_uuid = %company, service_type = %service),
        err
    )]
    async fn set_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
        fee_minor: u64,
    ) -> Result<FeeSettingRecord, FeesServiceError> {
        let mut tx = self.db.begin().await?;

        let setting = self
            .repository
            .upsert_fee_setting(&mut tx, company, service, fee_minor)
            .await?;

        tx.commit().await?;

        info!(fee_minor, "fee setting stored");

        Ok(setting)
    }

    async fn get_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<Option<FeeSettingRecord>, FeesServiceError> {
        let mut tx = self.db.begin().await?;

        let setting = self
            .repository
            .get_fee_setting(&mut tx, company, service)
            .await?;

        tx.commit().await?;

        Ok(setting)
    }

    async fn effective_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<u64, FeesServiceError> {
        let setting = self.get_fee(company, service).await?;

        Ok(self
            .policy
            .resolve(setting.map(|setting| setting.fee_minor)))
    }

    async fn list_fees(&self, company: CompanyUuid) -> Result<Vec<FeeSettingRecord>, FeesServiceError> {
        let mut tx = self.db.begin().await?;

        let settings = self.repository.list_fee_settings(&mut tx, company).await?;

        tx.commit().await?;

        Ok(settings)
    }

    #[tracing::instrument(
        name = "fees.service.clear_fee",
        skip(self),
        fields(company_uuid = %company, service_type = %service),
        err
    )]
    async fn clear_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<(), FeesServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self
            .repository
            .delete_fee_setting(&mut tx, company, service)
            .await?;

        if rows_affected == 0 {
            return Err(FeesServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait FeesService: Send + Sync {
    /// Set the fee charged per award for `(company, service)`.
    async fn set_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
        fee_minor: u64,
    ) -> Result<FeeSettingRecord, FeesServiceError>;

    /// The explicit setting, if any.
    async fn get_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<Option<FeeSettingRecord>, FeesServiceError>;

    /// The fee that will actually be charged: the explicit setting or the global default.
    async fn effective_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<u64, FeesServiceError>;

    async fn list_fees(&self, company: CompanyUuid) -> Result<Vec<FeeSettingRecord>, FeesServiceError>;

    /// Remove the explicit setting so the default applies again.
    async fn clear_fee(
        &self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<(), FeesServiceError>;
}

#[cfg(test)]
mod tests {
    use perkwise::fees::DEFAULT_FEE_MINOR;
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn effective_fee_falls_back_to_default() -> TestResult {
        let ctx = TestContext::new().await;

        assert_eq!(
            ctx.fees.effective_fee(ctx.company, ServiceType::Points).await?,
            DEFAULT_FEE_MINOR
        );

        ctx.fees.set_fee(ctx.company, ServiceType::Points, 25).await?;

        assert_eq!(ctx.fees.effective_fee(ctx.company, ServiceType::Points).await?, 25);
        assert_eq!(
            ctx.fees.effective_fee(ctx.company, ServiceType::Stamps).await?,
            DEFAULT_FEE_MINOR
        );

        ctx.fees.clear_fee(ctx.company, ServiceType::Points).await?;

        assert_eq!(
            ctx.fees.effective_fee(ctx.company, ServiceType::Points).await?,
            DEFAULT_FEE_MINOR
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn set_fee_overwrites_previous_setting() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.fees.set_fee(ctx.company, ServiceType::Cashback, 5).await?;
        ctx.fees.set_fee(ctx.company, ServiceType::Cashback, 7).await?;
        ctx.fees.set_fee(ctx.company, ServiceType::Points, 0).await?;

        let settings = ctx.fees.list_fees(ctx.company).await?;

        assert_eq!(settings.len(), 2);
        assert!(
            settings
                .iter()
                .any(|setting| setting.service_type == ServiceType::Cashback
                    && setting.fee_minor == 7)
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn clearing_a_missing_setting_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.fees.clear_fee(ctx.company, ServiceType::Coupons).await;

        assert!(
            matches!(result, Err(FeesServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
