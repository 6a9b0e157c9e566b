//! Rule Types
//!
//! One module per rule type. Each owns its configuration shape, its write-time validation,
//! and the points formula the matcher dispatches to.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::rules::RuleConfigError;

pub mod category;
pub mod digital_behavior;
pub mod event;
pub mod first_purchase;
pub mod frequency;
pub mod geolocation;
pub mod inventory;
pub mod recurrence;
pub mod special_date;
pub mod value_spent;

pub use category::Category;
pub use digital_behavior::DigitalBehavior;
pub use event::NamedEvent;
pub use first_purchase::FirstPurchase;
pub use frequency::Frequency;
pub use geolocation::Geolocation;
pub use inventory::Inventory;
pub use recurrence::Recurrence;
pub use special_date::SpecialDate;
pub use value_spent::ValueSpent;

/// `floor(base * multiplier)`, saturating at zero and `u64::MAX`.
pub(crate) fn multiply(base: u64, multiplier: Decimal) -> u64 {
    Decimal::from(base)
        .checked_mul(multiplier)
        .map_or(u64::MAX, |product| product.floor().to_u64().unwrap_or(0))
}

pub(crate) fn validate_multiplier(
    rule_type: &'static str,
    multiplier: Decimal,
) -> Result<(), RuleConfigError> {
    if multiplier <= Decimal::ZERO {
        return Err(RuleConfigError::Invalid {
            rule_type,
            reason: "multiplier must be positive",
        });
    }

    Ok(())
}
