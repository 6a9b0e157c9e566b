//! Rules service errors.

use perkwise::rules::RuleConfigError;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesServiceError {
    #[error("rule already exists")]
    AlreadyExists,

    #[error("rule not found")]
    NotFound,

    #[error("invalid rule config")]
    InvalidConfig(#[from] RuleConfigError),

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for RulesServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_map_to_not_found() {
        let error = RulesServiceError::from(Error::RowNotFound);

        assert!(
            matches!(error, RulesServiceError::NotFound),
            "expected NotFound, got {error:?}"
        );
    }

    #[test]
    fn other_errors_are_kept_as_storage_errors() {
        let error = RulesServiceError::from(Error::PoolTimedOut);

        assert!(
            matches!(error, RulesServiceError::Sql(Error::PoolTimedOut)),
            "expected Sql, got {error:?}"
        );
    }
}
