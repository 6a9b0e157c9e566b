//! Perkwise Domain Concerns

pub mod fees;
pub mod points;
pub mod purchases;
pub mod rules;
pub mod wallets;

mod columns;
