//! Shared models, traits and the deposit-then-withdraw liquidity cycle.
//!
//! The cycle itself ([`orchestrator::LiquidityOrchestrator`]) is chain agnostic: every remote
//! interaction goes through [`traits::ChainClient`], and every settling delay goes through
//! [`traits::Pause`]. Concrete clients live in sibling crates.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod approval;
pub mod calldata;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod pause;
pub mod pricing;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod traits;
mod transaction;

pub use alloy_primitives::{Address, Bytes, TxHash};
pub use num_bigint::BigUint;
