//! Fees

pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::FeesServiceError;
pub use service::*;
