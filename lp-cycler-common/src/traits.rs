use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use num_bigint::BigUint;

use crate::{
    errors::ChainError,
    models::{ContractCall, GasParams, PendingTransaction, PoolReserves, TransactionReceipt},
};

/// Access to a remote ledger on behalf of a single signer.
///
/// Reads are side-effect free and always reflect the latest state the node knows about.
/// Implementations must not cache any of them.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the account signing every submitted transaction.
    fn signer(&self) -> Address;

    /// Pool for the given pair, or the zero address if the factory knows none.
    async fn get_pool(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ChainError>;

    async fn get_reserves(&self, pool: Address) -> Result<PoolReserves, ChainError>;

    async fn token0(&self, pool: Address) -> Result<Address, ChainError>;

    /// Total supply of the pool's LP token.
    async fn total_supply(&self, pool: Address) -> Result<BigUint, ChainError>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<BigUint, ChainError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<BigUint, ChainError>;

    async fn symbol(&self, token: Address) -> Result<String, ChainError>;

    /// Gas the call would consume at the given price, or at the node's default fees if none is
    /// given. Fails with [`ChainError::Estimation`] if it would revert.
    async fn estimate_gas(
        &self,
        call: &ContractCall,
        gas_price: Option<u128>,
    ) -> Result<u64, ChainError>;

    /// Current network gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainError>;

    /// Signs and broadcasts the call. Returns as soon as the node accepted it.
    async fn submit(
        &self,
        call: &ContractCall,
        gas: GasParams,
    ) -> Result<PendingTransaction, ChainError>;

    /// Blocks until the transaction has one confirmation.
    ///
    /// A mined transaction that failed is reported as [`ChainError::Reverted`].
    async fn await_finality(
        &self,
        pending: PendingTransaction,
    ) -> Result<TransactionReceipt, ChainError>;
}

/// Strategy for the fixed settling delays of a cycle.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}
