//! Perkwise
//!
//! Perkwise is a points rule evaluation and ledger engine for multi-tenant loyalty programmes.
//! Companies configure rules; every business event is evaluated against them in two phases and
//! each awarded point is paid for from company wallets before it reaches the user.

pub mod evaluator;
pub mod fees;
pub mod history;
pub mod ledger;
pub mod matcher;
pub mod memory;
pub mod payload;
pub mod rules;
pub mod stamps;
pub mod store;
pub mod uuids;

pub use evaluator::{Engine, EngineConfig, EngineError, Evaluation, FeeSettlement, RuleAward};
pub use memory::MemoryStore;
pub use payload::EventPayload;
