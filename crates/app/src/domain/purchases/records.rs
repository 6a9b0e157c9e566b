//! Purchase Records

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use perkwise::uuids::{CompanyUuid, TypedUuid, UserUuid};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, Row, postgres::PgRow};

/// Purchase UUID
pub type PurchaseUuid = TypedUuid<PurchaseRecord>;

/// Purchase Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRecord {
    pub uuid: PurchaseUuid,
    pub company: CompanyUuid,
    pub user: UserUuid,
    pub amount: Decimal,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
}

/// A purchase to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub uuid: PurchaseUuid,
    pub amount: Decimal,
    pub occurred_at: Timestamp,
}

impl NewPurchase {
    #[must_use]
    pub fn new(amount: Decimal, occurred_at: Timestamp) -> Self {
        Self {
            uuid: PurchaseUuid::new(),
            amount,
            occurred_at,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for PurchaseRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PurchaseUuid::from_uuid(row.try_get("uuid")?),
            company: CompanyUuid::from_uuid(row.try_get("company_uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            amount: row.try_get("amount")?,
            occurred_at: row.try_get::<SqlxTimestamp, _>("occurred_at")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
