//! Rule Records

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use perkwise::{
    rules::{RuleConfig, StoredRule},
    uuids::{CompanyUuid, RuleUuid},
};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, Row, postgres::PgRow};

/// Rule Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRecord {
    pub uuid: RuleUuid,
    pub company: CompanyUuid,
    pub name: String,
    pub rule_type: String,
    pub config: Value,
    pub active: bool,
    pub visible: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RuleRecord {
    /// The raw rule as the engine loads it.
    #[must_use]
    pub fn to_stored(&self) -> StoredRule {
        StoredRule {
            uuid: self.uuid,
            company: self.company,
            name: self.name.clone(),
            active: self.active,
            visible: self.visible,
            rule_type: self.rule_type.clone(),
            config: self.config.clone(),
        }
    }
}

impl From<RuleRecord> for StoredRule {
    fn from(record: RuleRecord) -> Self {
        Self {
            uuid: record.uuid,
            company: record.company,
            name: record.name,
            active: record.active,
            visible: record.visible,
            rule_type: record.rule_type,
            config: record.config,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for RuleRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: RuleUuid::from_uuid(row.try_get("uuid")?),
            company: CompanyUuid::from_uuid(row.try_get("company_uuid")?),
            name: row.try_get("name")?,
            rule_type: row.try_get("rule_type")?,
            config: row.try_get("config")?,
            active: row.try_get("active")?,
            visible: row.try_get("visible")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

/// Replacement settings for an existing rule; the active flag is left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleUpdate {
    pub name: String,
    pub visible: bool,
    pub cooldown_days: u32,
    pub config: RuleConfig,
}
