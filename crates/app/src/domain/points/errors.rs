//! Points service errors.

use perkwise::{EngineError, uuids::RuleUuid};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PointsServiceError {
    #[error("rule {0} not found")]
    RuleNotFound(RuleUuid),

    #[error("storage error")]
    Storage(#[source] BoxError),
}

impl From<EngineError> for PointsServiceError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::RuleNotFound(rule) => Self::RuleNotFound(rule),
            EngineError::Store(source) => Self::Storage(source),
        }
    }
}
