//! Ledger Store
//!
//! Three wallet kinds move points and money: the company fee wallet (monetary, minor units),
//! the company points reserve, and the user points wallet. Each wallet is a cached balance
//! plus an append-only posting log; the balance always equals the signed sum of its postings
//! and never goes negative.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    store::UnitOfWork,
    uuids::{CompanyUuid, UserUuid},
};

mod errors;
pub mod wallet;

pub use errors::{LedgerError, PostingError};
pub use wallet::{Entry, Posting, Wallet, reconciles};

/// A wallet's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner", rename_all = "snake_case")]
pub enum Account {
    /// Prepaid money a company spends on fees, in minor currency units.
    CompanyFees(CompanyUuid),
    /// Points a company has bought and not yet awarded.
    CompanyPoints(CompanyUuid),
    /// Points a user holds.
    UserPoints(UserUuid),
}

impl Account {
    /// Rebuild an account from its stored `(kind, owner)` pair.
    #[must_use]
    pub fn new(kind: AccountKind, owner: Uuid) -> Self {
        match kind {
            AccountKind::CompanyFees => Self::CompanyFees(CompanyUuid::from_uuid(owner)),
            AccountKind::CompanyPoints => Self::CompanyPoints(CompanyUuid::from_uuid(owner)),
            AccountKind::UserPoints => Self::UserPoints(UserUuid::from_uuid(owner)),
        }
    }

    /// The company or user owning the wallet.
    #[must_use]
    pub const fn owner(&self) -> Uuid {
        match self {
            Self::CompanyFees(company) | Self::CompanyPoints(company) => company.into_uuid(),
            Self::UserPoints(user) => user.into_uuid(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        match self {
            Self::CompanyFees(_) => AccountKind::CompanyFees,
            Self::CompanyPoints(_) => AccountKind::CompanyPoints,
            Self::UserPoints(_) => AccountKind::UserPoints,
        }
    }
}

/// Wallet kind without its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// See [`Account::CompanyFees`].
    CompanyFees,
    /// See [`Account::CompanyPoints`].
    CompanyPoints,
    /// See [`Account::UserPoints`].
    UserPoints,
}

impl AccountKind {
    pub const ALL: [Self; 3] = [Self::CompanyFees, Self::CompanyPoints, Self::UserPoints];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompanyFees => "company_fees",
            Self::CompanyPoints => "company_points",
            Self::UserPoints => "user_points",
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A stored wallet or transaction tag that names no known variant.
#[derive(Debug, Error)]
#[error("unknown {what} `{value}`")]
pub struct UnknownTag {
    pub what: &'static str,
    pub value: String,
}

impl FromStr for AccountKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTag {
                what: "account kind",
                value: s.to_string(),
            })
    }
}

/// Transaction type of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingKind {
    /// Company wallet top-up.
    Credit,

    /// Company wallet charge (fees, point reservations).
    Debit,

    /// Points earned by a user through a rule.
    Award,

    /// Points spent by a user.
    Redeem,

    /// Manual correction of a user balance.
    Adjustment,
}

impl PostingKind {
    pub const ALL: [Self; 5] = [
        Self::Credit,
        Self::Debit,
        Self::Award,
        Self::Redeem,
        Self::Adjustment,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Award => "award",
            Self::Redeem => "redeem",
            Self::Adjustment => "adjustment",
        }
    }

    /// Company wallets take credits and debits; user wallets take the rest.
    #[must_use]
    pub const fn allowed_on(self, account: AccountKind) -> bool {
        match account {
            AccountKind::CompanyFees | AccountKind::CompanyPoints => {
                matches!(self, Self::Credit | Self::Debit)
            }
            AccountKind::UserPoints => matches!(self, Self::Award | Self::Redeem | Self::Adjustment),
        }
    }

    #[must_use]
    pub const fn accepts_sign(self, amount: i64) -> bool {
        match self {
            Self::Credit | Self::Award => amount > 0,
            Self::Debit | Self::Redeem => amount < 0,
            Self::Adjustment => true,
        }
    }
}

impl Display for PostingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostingKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTag {
                what: "posting kind",
                value: s.to_string(),
            })
    }
}

/// Wallet storage with pessimistic locking.
#[async_trait]
pub trait WalletLedger: UnitOfWork {
    /// Fetch (creating at zero if missing) and exclusively lock a wallet for the rest of the unit.
    async fn lock_wallet(&mut self, account: Account) -> Result<Wallet, Self::Error>;

    /// Persist a posting and its `balance_after` as the wallet's new balance.
    async fn record_posting(&mut self, posting: &Posting) -> Result<(), Self::Error>;
}

/// Lock `account`, apply `entry`, and persist the resulting posting.
///
/// # Errors
///
/// [`PostingError::Rejected`] when the entry breaks a wallet invariant (nothing is written),
/// [`PostingError::Store`] when the store fails.
pub async fn post<L: WalletLedger + ?Sized>(
    ledger: &mut L,
    account: Account,
    entry: Entry,
) -> Result<Posting, PostingError<L::Error>> {
    let mut wallet = ledger.lock_wallet(account).await.map_err(PostingError::Store)?;

    let posting = wallet.apply(entry)?;

    ledger
        .record_posting(&posting)
        .await
        .map_err(PostingError::Store)?;

    Ok(posting)
}
