//! Wallet arithmetic.
//!
//! A [`Wallet`] is a locked balance. Applying an [`Entry`] yields the [`Posting`] that must be
//! persisted together with the new balance; a rejected entry leaves the wallet untouched.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    ledger::{Account, LedgerError, PostingKind},
    uuids::{CompanyUuid, RuleUuid},
};

/// A wallet balance read under an exclusive lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wallet {
    pub account: Account,
    pub balance: u64,
}

/// A requested balance movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: PostingKind,

    /// Signed amount: positive credits the wallet, negative debits it.
    pub amount: i64,

    pub memo: String,

    /// Originating rule, for awards.
    pub rule: Option<RuleUuid>,

    /// Company an award or redemption is attributed to.
    pub company: Option<CompanyUuid>,

    pub occurred_at: Timestamp,
}

impl Entry {
    fn new(kind: PostingKind, amount: i64, memo: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            memo: memo.into(),
            rule: None,
            company: None,
            occurred_at: Timestamp::now(),
        }
    }

    /// Company wallet top-up.
    #[must_use]
    pub fn credit(amount: u64, memo: impl Into<String>) -> Self {
        Self::new(PostingKind::Credit, saturating_i64(amount), memo)
    }

    /// Company wallet charge.
    #[must_use]
    pub fn debit(amount: u64, memo: impl Into<String>) -> Self {
        Self::new(PostingKind::Debit, -saturating_i64(amount), memo)
    }

    /// Points awarded to a user by `rule` of `company`.
    #[must_use]
    pub fn award(points: u64, company: CompanyUuid, rule: RuleUuid, memo: impl Into<String>) -> Self {
        Self {
            rule: Some(rule),
            company: Some(company),
            ..Self::new(PostingKind::Award, saturating_i64(points), memo)
        }
    }

    /// Points spent by a user.
    #[must_use]
    pub fn redeem(points: u64, company: Option<CompanyUuid>, memo: impl Into<String>) -> Self {
        Self {
            company,
            ..Self::new(PostingKind::Redeem, -saturating_i64(points), memo)
        }
    }

    /// Manual correction in either direction.
    #[must_use]
    pub fn adjustment(delta: i64, memo: impl Into<String>) -> Self {
        Self::new(PostingKind::Adjustment, delta, memo)
    }

    #[must_use]
    pub fn at(mut self, occurred_at: Timestamp) -> Self {
        self.occurred_at = occurred_at;
        self
    }
}

fn saturating_i64(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// A committed balance movement; the append-only audit record of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub account: Account,
    pub kind: PostingKind,
    pub amount: i64,
    pub balance_after: u64,
    pub memo: String,
    pub rule: Option<RuleUuid>,
    pub company: Option<CompanyUuid>,
    pub occurred_at: Timestamp,
}

impl Wallet {
    /// A wallet that has never been posted to.
    #[must_use]
    pub const fn empty(account: Account) -> Self {
        Self {
            account,
            balance: 0,
        }
    }

    /// Apply `entry`, returning the posting to persist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the entry does not belong on this wallet, has the wrong
    /// sign, or would take the balance below zero or past `u64::MAX`.
    pub fn apply(&mut self, entry: Entry) -> Result<Posting, LedgerError> {
        let account = self.account.kind();

        if !entry.kind.allowed_on(account) {
            return Err(LedgerError::WrongAccount {
                account,
                kind: entry.kind,
            });
        }

        if entry.amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        if !entry.kind.accepts_sign(entry.amount) {
            return Err(LedgerError::WrongSign { kind: entry.kind });
        }

        let balance_after = i128::from(self.balance) + i128::from(entry.amount);

        if balance_after < 0 {
            return Err(LedgerError::InsufficientBalance {
                account,
                available: self.balance,
                requested: entry.amount.unsigned_abs(),
            });
        }

        let balance_after =
            u64::try_from(balance_after).map_err(|_source| LedgerError::Overflow { account })?;

        self.balance = balance_after;

        Ok(Posting {
            account: self.account,
            kind: entry.kind,
            amount: entry.amount,
            balance_after,
            memo: entry.memo,
            rule: entry.rule,
            company: entry.company,
            occurred_at: entry.occurred_at,
        })
    }
}

/// Whether `balance` equals the signed sum of `postings`.
#[must_use]
pub fn reconciles(balance: u64, postings: &[Posting]) -> bool {
    let sum: i128 = postings
        .iter()
        .map(|posting| i128::from(posting.amount))
        .sum();

    sum == i128::from(balance)
}

#[cfg(test)]
mod tests {
    use crate::{ledger::AccountKind, uuids::UserUuid};

    use super::*;

    #[test]
    fn debit_beyond_balance_is_rejected_and_leaves_wallet_untouched() {
        let company = CompanyUuid::new();
        let mut wallet = Wallet {
            account: Account::CompanyPoints(company),
            balance: 5,
        };

        let result = wallet.apply(Entry::debit(6, "reserve"));

        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                account: AccountKind::CompanyPoints,
                available: 5,
                requested: 6,
            })
        );
        assert_eq!(wallet.balance, 5);
    }

    #[test]
    fn postings_reconcile_with_balance() -> Result<(), LedgerError> {
        let mut wallet = Wallet::empty(Account::CompanyFees(CompanyUuid::new()));

        let postings = vec![
            wallet.apply(Entry::credit(100, "top-up"))?,
            wallet.apply(Entry::debit(10, "fee"))?,
            wallet.apply(Entry::debit(10, "fee"))?,
        ];

        assert_eq!(wallet.balance, 80);
        assert_eq!(postings.last().map(|p| p.balance_after), Some(80));
        assert!(reconciles(wallet.balance, &postings));
        assert!(!reconciles(wallet.balance + 1, &postings));

        Ok(())
    }

    #[test]
    fn awards_only_land_on_user_wallets() {
        let company = CompanyUuid::new();
        let mut wallet = Wallet::empty(Account::CompanyPoints(company));

        let result = wallet.apply(Entry::award(5, company, RuleUuid::new(), "award"));

        assert!(
            matches!(result, Err(LedgerError::WrongAccount { .. })),
            "expected WrongAccount, got {result:?}"
        );
    }

    #[test]
    fn adjustments_move_either_way_but_never_below_zero() -> Result<(), LedgerError> {
        let mut wallet = Wallet::empty(Account::UserPoints(UserUuid::new()));

        wallet.apply(Entry::adjustment(20, "goodwill"))?;
        wallet.apply(Entry::adjustment(-15, "correction"))?;

        assert_eq!(wallet.balance, 5);
        assert!(wallet.apply(Entry::adjustment(-6, "too much")).is_err());
        assert_eq!(wallet.apply(Entry::adjustment(0, "noop")), Err(LedgerError::ZeroAmount));

        Ok(())
    }

    #[test]
    fn overflow_is_rejected() {
        let mut wallet = Wallet {
            account: Account::UserPoints(UserUuid::new()),
            balance: u64::MAX,
        };

        assert_eq!(
            wallet.apply(Entry::adjustment(1, "overflow")),
            Err(LedgerError::Overflow {
                account: AccountKind::UserPoints
            })
        );
    }
}
