//! Fee Settings Repository

use perkwise::{fees::ServiceType, uuids::CompanyUuid};
use sqlx::{Postgres, Transaction, query, query_as};

use crate::domain::{columns::to_bigint, fees::records::FeeSettingRecord};

const UPSERT_FEE_SETTING_SQL: &str = include_str!("sql/upsert_fee_setting.sql");
const GET_FEE_SETTING_SQL: &str = include_str!("sql/get_fee_setting.sql");
const LIST_FEE_SETTINGS_SQL: &str = include_str!("sql/list_fee_settings.sql");
const DELETE_FEE_SETTING_SQL: &str = include_str!("sql/delete_fee_setting.sql");

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PgFeesRepository;

impl PgFeesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn upsert_fee_setting(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        service: ServiceType,
        fee_minor: u64,
    ) -> Result<FeeSettingRecord, sqlx::Error> {
        query_as::<Postgres, FeeSettingRecord>(UPSERT_FEE_SETTING_SQL)
            .bind(company.into_uuid())
            .bind(service.as_str())
            .bind(to_bigint(fee_minor)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_fee_setting(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<Option<FeeSettingRecord>, sqlx::Error> {
        query_as::<Postgres, FeeSettingRecord>(GET_FEE_SETTING_SQL)
            .bind(company.into_uuid())
            .bind(service.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_fee_settings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
    ) -> Result<Vec<FeeSettingRecord>, sqlx::Error> {
        query_as::<Postgres, FeeSettingRecord>(LIST_FEE_SETTINGS_SQL)
            .bind(company.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn delete_fee_setting(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_FEE_SETTING_SQL)
            .bind(company.into_uuid())
            .bind(service.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
