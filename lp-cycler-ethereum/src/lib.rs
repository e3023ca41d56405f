//! Ethereum JSON-RPC implementation of [`ChainClient`](lp_cycler_common::traits::ChainClient).
//!
//! Works against any EVM chain accepting legacy or EIP-1559 transactions, zkSync Era included.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod abi;
pub mod client;
pub mod errors;

use alloy::primitives::U256;
use num_bigint::BigUint;

pub use client::EthereumChainClient;
pub use errors::RPCError;

/// Converts an on-chain integer into an arbitrary precision one.
pub fn u256_to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Converts an amount into a `uint256`, failing if it needs more than 256 bits.
pub fn biguint_to_u256(value: &BigUint) -> Result<U256, RPCError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(RPCError::ConversionError(format!("{value} does not fit in 256 bits")));
    }
    Ok(U256::from_be_slice(&bytes))
}
