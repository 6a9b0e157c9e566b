//! Points

pub mod errors;
pub mod service;

pub use errors::PointsServiceError;
pub use service::*;
