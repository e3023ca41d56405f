use alloy_primitives::{Address, TxHash};
use thiserror::Error;

use crate::models::CompletedTransaction;

/// Errors surfaced by a [`ChainClient`](crate::traits::ChainClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Network or RPC layer failure.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),
    /// The node refused to estimate the call, usually because it would revert.
    #[error("Gas estimation failed for {call}: {reason}")]
    Estimation { call: String, reason: String },
    /// The transaction was mined but failed.
    #[error("Transaction {0} reverted")]
    Reverted(TxHash),
    /// The node answered with something that could not be decoded or used.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Every way a liquidity cycle can fail. None of them is recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Pool not found for pair {token_a} / {token_b}")]
    PoolNotFound { token_a: Address, token_b: Address },
    #[error("Pool {pool} reports token0 {token0}, which is neither {token_a} nor {token_b}")]
    PoolTokenMismatch { pool: Address, token0: Address, token_a: Address, token_b: Address },
    #[error("Gas estimation failed for {call}: {reason}")]
    Estimation { call: String, reason: String },
    #[error("Transaction {0} reverted")]
    TransactionReverted(TxHash),
    #[error("Cannot price pool {pool}: reserve{index} is zero")]
    PricingPrecondition { pool: Address, index: usize },
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),
}

impl From<ChainError> for CycleError {
    fn from(value: ChainError) -> Self {
        match value {
            ChainError::Unavailable(msg) => CycleError::RemoteUnavailable(msg),
            ChainError::Estimation { call, reason } => CycleError::Estimation { call, reason },
            ChainError::Reverted(hash) => CycleError::TransactionReverted(hash),
            ChainError::InvalidResponse(msg) => {
                CycleError::RemoteUnavailable(format!("invalid response: {msg}"))
            }
        }
    }
}

/// A failed cycle, along with the transactions that reached finality before the failure.
///
/// A non-empty `completed` list after a deposit means an LP position may be left outstanding and
/// needs manual resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error} ({count} transaction(s) completed before failure)", count = .completed.len())]
pub struct CycleFailure {
    #[source]
    pub error: CycleError,
    pub completed: Vec<CompletedTransaction>,
}
