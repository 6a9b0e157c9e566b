//! Engine Config

use clap::Args;
use perkwise::{EngineConfig, FeeSettlement, fees::FeePolicy};

/// Points engine settings.
#[derive(Debug, Clone, Args)]
pub struct EngineArgs {
    /// Fee charged per award when a company has no explicit setting, in minor currency units
    #[arg(long, env = "DEFAULT_POINTS_FEE_MINOR", default_value_t = perkwise::fees::DEFAULT_FEE_MINOR)]
    pub default_points_fee_minor: u64,

    /// Whether a charged fee is kept (sunk) or refunded (atomic) when the points reserve is short
    #[arg(long, env = "FEE_SETTLEMENT", default_value = "sunk")]
    pub fee_settlement: FeeSettlement,
}

impl EngineArgs {
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            fees: FeePolicy::with_default_fee(self.default_points_fee_minor),
            settlement: self.fee_settlement,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        engine: EngineArgs,
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let harness = Harness::try_parse_from([
            "perkwise-app",
            "--default-points-fee-minor",
            "25",
            "--fee-settlement",
            "atomic",
        ])?;

        let config = harness.engine.engine_config();

        assert_eq!(config.fees.default_fee, 25);
        assert_eq!(config.settlement, FeeSettlement::Atomic);

        Ok(())
    }

    #[test]
    fn unknown_settlements_are_rejected() {
        let result =
            Harness::try_parse_from(["perkwise-app", "--fee-settlement", "eventually"]);

        assert!(result.is_err());
    }
}
