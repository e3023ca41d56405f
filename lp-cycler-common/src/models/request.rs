use std::fmt;

use alloy_primitives::{Address, Bytes};
use num_bigint::BigUint;

/// An amount of a single token, in the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount {
    pub token: Address,
    pub amount: BigUint,
}

impl TokenAmount {
    pub fn new(token: Address, amount: BigUint) -> Self {
        Self { token, amount }
    }
}

/// Arguments of the router's `addLiquidity2` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    pub pool: Address,
    pub inputs: Vec<TokenAmount>,
    /// Opaque payload forwarded to the pool, usually the LP token recipient.
    pub data: Bytes,
    pub min_liquidity: BigUint,
    /// Zero address when no callback is wanted.
    pub callback: Address,
    pub callback_data: Bytes,
}

/// Arguments of the router's `burnLiquidity` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub pool: Address,
    pub liquidity: BigUint,
    /// Opaque payload forwarded to the pool: recipient followed by the withdraw mode.
    pub data: Bytes,
    /// Minimum amounts per token, in the pool's canonical token order.
    pub min_amounts: Vec<BigUint>,
    pub callback: Address,
    pub callback_data: Bytes,
}

/// A state changing contract call.
///
/// The same value is handed to gas estimation and to submission, so both always describe the
/// exact same call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    Approve { token: Address, spender: Address, amount: BigUint },
    AddLiquidity { router: Address, request: DepositRequest },
    BurnLiquidity { router: Address, request: WithdrawalRequest },
}

impl ContractCall {
    /// The contract the call is sent to.
    pub fn target(&self) -> Address {
        match self {
            ContractCall::Approve { token, .. } => *token,
            ContractCall::AddLiquidity { router, .. } => *router,
            ContractCall::BurnLiquidity { router, .. } => *router,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::Approve { .. } => "approve",
            ContractCall::AddLiquidity { .. } => "addLiquidity2",
            ContractCall::BurnLiquidity { .. } => "burnLiquidity",
        }
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractCall::Approve { token, spender, amount } => {
                write!(f, "approve({spender}, {amount}) on {token}")
            }
            ContractCall::AddLiquidity { router, request } => {
                write!(
                    f,
                    "addLiquidity2({}, {} inputs, min {}) on {router}",
                    request.pool,
                    request.inputs.len(),
                    request.min_liquidity
                )
            }
            ContractCall::BurnLiquidity { router, request } => {
                write!(f, "burnLiquidity({}, {}) on {router}", request.pool, request.liquidity)
            }
        }
    }
}

/// Gas settings attached to a submission.
///
/// A missing `gas_price` leaves fee selection to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    pub gas_limit: u64,
    pub gas_price: Option<u128>,
}
