//! Wallets service errors.

use perkwise::ledger::{LedgerError, PostingError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletsServiceError {
    #[error("wallet movement rejected")]
    Rejected(#[from] LedgerError),

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for WalletsServiceError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<PostingError<Error>> for WalletsServiceError {
    fn from(error: PostingError<Error>) -> Self {
        match error {
            PostingError::Rejected(error) => Self::Rejected(error),
            PostingError::Store(error) => error.into(),
        }
    }
}
