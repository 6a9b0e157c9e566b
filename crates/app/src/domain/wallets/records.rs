//! Wallet Records

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use perkwise::{
    ledger::{Account, AccountKind, Posting, PostingKind},
    uuids::{CompanyUuid, RuleUuid, TypedUuid},
};
use serde::Serialize;
use sqlx::{Error, FromRow, Row, postgres::PgRow};
use uuid::Uuid;

use crate::domain::columns::from_bigint;

/// Wallet Transaction UUID
pub type TransactionUuid = TypedUuid<TransactionRecord>;

/// A persisted posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub uuid: TransactionUuid,

    #[serde(flatten)]
    pub posting: Posting,

    pub created_at: Timestamp,
}

/// Balance against the signed sum of a wallet's transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub account: Account,
    pub balance: u64,
    pub ledger_total: i64,
}

impl Reconciliation {
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        i128::from(self.balance) == i128::from(self.ledger_total)
    }
}

fn parse_column<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value: String = row.try_get(column)?;

    value.parse().map_err(|source| Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    })
}

impl<'r> FromRow<'r, PgRow> for TransactionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let account_kind: AccountKind = parse_column(row, "account_kind")?;
        let kind: PostingKind = parse_column(row, "kind")?;

        let posting = Posting {
            account: Account::new(account_kind, row.try_get("owner_uuid")?),
            kind,
            amount: row.try_get("amount")?,
            balance_after: from_bigint(row.try_get("balance_after")?, "balance_after")?,
            memo: row.try_get("memo")?,
            rule: row
                .try_get::<Option<Uuid>, _>("rule_uuid")?
                .map(RuleUuid::from_uuid),
            company: row
                .try_get::<Option<Uuid>, _>("company_uuid")?
                .map(CompanyUuid::from_uuid),
            occurred_at: row.try_get::<SqlxTimestamp, _>("occurred_at")?.to_jiff(),
        };

        Ok(Self {
            uuid: TransactionUuid::from_uuid(row.try_get("uuid")?),
            posting,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

#[cfg(test)]
mod tests {
    use perkwise::uuids::UserUuid;

    use super::*;

    #[test]
    fn reconciliation_compares_balance_with_ledger_total() {
        let account = Account::UserPoints(UserUuid::new());

        let balanced = Reconciliation {
            account,
            balance: 40,
            ledger_total: 40,
        };

        let drifted = Reconciliation {
            ledger_total: 35,
            ..balanced
        };

        assert!(balanced.is_balanced());
        assert!(!drifted.is_balanced());
    }
}
