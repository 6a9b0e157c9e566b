//! Fee Policy
//!
//! Companies pay a small monetary fee per successful award. Fees are configured per
//! `(company, service type)` and fall back to a global default. Amounts are in minor currency
//! units (cents).

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{store::UnitOfWork, uuids::CompanyUuid};

/// Global default fee per award: $0.10.
pub const DEFAULT_FEE_MINOR: u64 = 10;

/// Product line a fee applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Points,
    Cashback,
    Coupons,
    Stamps,
    Commissions,
}

impl ServiceType {
    pub const ALL: [Self; 5] = [
        Self::Points,
        Self::Cashback,
        Self::Coupons,
        Self::Stamps,
        Self::Commissions,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Cashback => "cashback",
            Self::Coupons => "coupons",
            Self::Stamps => "stamps",
            Self::Commissions => "commissions",
        }
    }
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown service type `{0}`")]
pub struct UnknownServiceType(pub String);

impl FromStr for ServiceType {
    type Err = UnknownServiceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| UnknownServiceType(s.to_string()))
    }
}

/// Resolves the fee to charge given an optional explicit setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    pub default_fee: u64,
}

impl FeePolicy {
    #[must_use]
    pub const fn with_default_fee(default_fee: u64) -> Self {
        Self { default_fee }
    }

    /// The explicit setting when present, else the default.
    #[must_use]
    pub fn resolve(&self, setting: Option<u64>) -> u64 {
        setting.unwrap_or(self.default_fee)
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::with_default_fee(DEFAULT_FEE_MINOR)
    }
}

/// Fee setting storage.
#[async_trait]
pub trait FeeSettings: UnitOfWork {
    /// The explicit fee for `(company, service)`, if one is configured.
    async fn fee_setting(
        &mut self,
        company: CompanyUuid,
        service: ServiceType,
    ) -> Result<Option<u64>, Self::Error>;
}
