//! Perkwise application layer: `PostgreSQL` persistence, services and configuration.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test;
