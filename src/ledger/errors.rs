//! Ledger errors.

use thiserror::Error;

use crate::ledger::{AccountKind, PostingKind};

/// A posting the ledger refuses because it would break a wallet invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient {account} balance: {available} available, {requested} requested")]
    InsufficientBalance {
        account: AccountKind,
        available: u64,
        requested: u64,
    },

    #[error("{account} balance would overflow")]
    Overflow { account: AccountKind },

    #[error("{kind} postings are not allowed on {account} wallets")]
    WrongAccount {
        account: AccountKind,
        kind: PostingKind,
    },

    #[error("{kind} posting has the wrong sign")]
    WrongSign { kind: PostingKind },

    #[error("postings must move a non-zero amount")]
    ZeroAmount,
}

/// Failure while posting to a wallet.
#[derive(Debug, Error)]
pub enum PostingError<E> {
    #[error(transparent)]
    Rejected(#[from] LedgerError),

    #[error("ledger storage failed")]
    Store(#[source] E),
}
