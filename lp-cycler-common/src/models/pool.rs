use alloy_primitives::Address;
use num_bigint::BigUint;
use serde::Serialize;

use crate::errors::CycleError;

/// Reserves of a pool, in the pool's canonical token order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReserves {
    pub reserve0: BigUint,
    pub reserve1: BigUint,
}

impl PoolReserves {
    pub fn new(reserve0: impl Into<BigUint>, reserve1: impl Into<BigUint>) -> Self {
        Self { reserve0: reserve0.into(), reserve1: reserve1.into() }
    }
}

/// A pool together with its two constituent tokens in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PoolTokens {
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
}

impl PoolTokens {
    /// Orders the caller's pair after the pool's own `token0` report.
    ///
    /// AMM pools sort their tokens independently of how a pair was requested, so `token1` is
    /// whichever of the two requested tokens is not `token0`. Fails if the pool reports a
    /// `token0` outside the requested pair.
    pub fn resolve(
        pool: Address,
        token0: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Self, CycleError> {
        let token1 = if token0 == token_a {
            token_b
        } else if token0 == token_b {
            token_a
        } else {
            return Err(CycleError::PoolTokenMismatch { pool, token0, token_a, token_b });
        };
        Ok(Self { pool, token0, token1 })
    }
}
