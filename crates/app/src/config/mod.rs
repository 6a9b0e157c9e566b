//! Command-line and environment configuration

pub mod db;
pub mod engine;
pub mod logging;

pub use db::DatabaseConfig;
pub use engine::EngineArgs;
pub use logging::{LogFormat, LoggingConfig};
