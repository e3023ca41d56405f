use alloy_primitives::{Address, TxHash};
use num_bigint::BigUint;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};

use super::CompletedTransaction;

/// Outcome of one successful deposit-then-withdraw cycle.
///
/// Amounts are serialized as decimal strings since they routinely exceed what JSON numbers can
/// represent.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
    /// Amounts deposited, in canonical token order.
    #[serde_as(as = "[DisplayFromStr; 2]")]
    pub deposited: [BigUint; 2],
    #[serde_as(as = "DisplayFromStr")]
    pub min_liquidity: BigUint,
    #[serde_as(as = "DisplayFromStr")]
    pub liquidity_burned: BigUint,
    #[serde_as(as = "[DisplayFromStr; 2]")]
    pub min_withdrawn: [BigUint; 2],
    pub deposit_tx: TxHash,
    pub withdraw_tx: TxHash,
    /// Every transaction of the cycle, approvals included.
    pub transactions: Vec<CompletedTransaction>,
}
