//! Fee Setting Records

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use perkwise::{fees::ServiceType, uuids::CompanyUuid};
use serde::Serialize;
use sqlx::{Error, FromRow, Row, postgres::PgRow};

use crate::domain::columns::from_bigint;

/// An explicit fee for one company and service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSettingRecord {
    pub company: CompanyUuid,
    pub service_type: ServiceType,

    /// Fee per award in minor currency units.
    pub fee_minor: u64,

    pub updated_at: Timestamp,
}

impl<'r> FromRow<'r, PgRow> for FeeSettingRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let service_type: String = row.try_get("service_type")?;

        let service_type = service_type
            .parse::<ServiceType>()
            .map_err(|source| Error::ColumnDecode {
                index: "service_type".to_string(),
                source: Box::new(source),
            })?;

        Ok(Self {
            company: CompanyUuid::from_uuid(row.try_get("company_uuid")?),
            service_type,
            fee_minor: from_bigint(row.try_get("fee_minor")?, "fee_minor")?,
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
