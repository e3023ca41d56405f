//! Configuration of a liquidity cycle.
//!
//! Every field has a default matching the zkSync Era deployment the tool was first written for,
//! so an empty YAML document is a valid configuration.

use std::time::Duration;

use alloy_primitives::{address, Address};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{errors::CycleError, models::BPS_DENOMINATOR};

pub const DEFAULT_POOL_FACTORY: Address = address!("f2DAd89f2788a8CD54625C60b55cD3d2D0ACa7Cb");
pub const DEFAULT_ROUTER: Address = address!("2da10A1e27bF85cEdD8FFb1AbBe97e53391C0295");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityConfig {
    /// Factory resolving token pairs to pools.
    pub factory: Address,
    /// Router receiving the deposit and withdrawal calls. Also the spender of every approval.
    pub router: Address,
    pub slippage: SlippagePolicy,
    pub delays: SettleDelays,
    pub approvals: ApprovalPolicy,
    /// Second word of the withdrawal payload. `1` unwraps the wrapped native asset.
    pub withdraw_mode: u8,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            factory: DEFAULT_POOL_FACTORY,
            router: DEFAULT_ROUTER,
            slippage: SlippagePolicy::default(),
            delays: SettleDelays::default(),
            approvals: ApprovalPolicy::default(),
            withdraw_mode: 1,
        }
    }
}

impl LiquidityConfig {
    pub fn validate(&self) -> Result<(), CycleError> {
        if self.factory == Address::ZERO {
            return Err(CycleError::Configuration("factory address must be set".to_string()));
        }
        if self.router == Address::ZERO {
            return Err(CycleError::Configuration("router address must be set".to_string()));
        }
        self.slippage.validate()
    }
}

/// Tolerances applied to estimated amounts, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlippagePolicy {
    /// Shortfall accepted on the LP tokens minted by the deposit.
    pub deposit_bps: u32,
    /// Shortfall accepted on each token returned by the withdrawal.
    pub withdraw_bps: u32,
    /// Extra gas added on top of the withdrawal estimate.
    pub burn_gas_buffer_bps: u32,
}

impl Default for SlippagePolicy {
    fn default() -> Self {
        Self { deposit_bps: 500, withdraw_bps: 500, burn_gas_buffer_bps: 1_000 }
    }
}

impl SlippagePolicy {
    fn validate(&self) -> Result<(), CycleError> {
        for (name, bps) in [("deposit_bps", self.deposit_bps), ("withdraw_bps", self.withdraw_bps)]
        {
            if bps > BPS_DENOMINATOR {
                return Err(CycleError::Configuration(format!(
                    "{name} must not exceed {BPS_DENOMINATOR}, got {bps}"
                )));
            }
        }
        Ok(())
    }

    /// Minimum accepted withdrawal output for a deposited amount, truncated.
    pub fn min_withdrawn(&self, deposited: &BigUint) -> BigUint {
        apply_haircut(deposited, self.withdraw_bps)
    }

    /// Withdrawal gas limit for a raw estimate, truncated and saturating at `u64::MAX`.
    pub fn burn_gas_limit(&self, estimate: u64) -> u64 {
        buffer_gas_limit(estimate, self.burn_gas_buffer_bps)
    }
}

/// `estimate * (1 + bps / 10000)`, truncated and saturating at `u64::MAX`.
pub(crate) fn buffer_gas_limit(estimate: u64, bps: u32) -> u64 {
    let buffered = u128::from(estimate) * (u128::from(BPS_DENOMINATOR) + u128::from(bps)) /
        u128::from(BPS_DENOMINATOR);
    u64::try_from(buffered).unwrap_or(u64::MAX)
}

/// `amount * (1 - bps / 10000)`, truncated. Anything above 10000 bps yields zero.
pub(crate) fn apply_haircut(amount: &BigUint, bps: u32) -> BigUint {
    amount * BPS_DENOMINATOR.saturating_sub(bps) / BPS_DENOMINATOR
}

/// Fixed delays letting read replicas catch up with freshly mined transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    /// Pause after every approval transaction (default: 3000ms)
    pub approval_settle_ms: u64,
    /// Pause between the deposit and reading the minted LP balance (default: 5000ms)
    pub deposit_settle_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self { approval_settle_ms: 3_000, deposit_settle_ms: 5_000 }
    }
}

impl SettleDelays {
    pub fn approval_settle(&self) -> Duration {
        Duration::from_millis(self.approval_settle_ms)
    }

    pub fn deposit_settle(&self) -> Duration {
        Duration::from_millis(self.deposit_settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalPolicy {
    /// Tickers whose `approve` rejects a nonzero to nonzero allowance change. Matched exactly.
    pub quirky_tickers: Vec<String>,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self { quirky_tickers: vec!["USDT".to_string()] }
    }
}

impl ApprovalPolicy {
    pub fn requires_revoke(&self, symbol: &str) -> bool {
        self.quirky_tickers
            .iter()
            .any(|ticker| ticker == symbol)
    }
}
