//! LP-equivalent pricing of a pool's constituent tokens.
//!
//! The price of token `i` is `(totalSupply / 2) / reserve_i`: the LP tokens one unit of token `i`
//! is worth, assuming it contributes half of the pool's value. This is a deliberately rough
//! estimate; callers apply a slippage haircut on top. Prices are kept as exact fractions so no
//! floating point value ever reaches a transaction.

use std::sync::Arc;

use alloy_primitives::Address;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use tracing::{debug, instrument};

use crate::{
    config::apply_haircut,
    errors::CycleError,
    models::PoolReserves,
    traits::ChainClient,
};

/// LP tokens per unit of a constituent token, as `numerator / denominator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpPrice {
    numerator: BigUint,
    denominator: BigUint,
}

impl LpPrice {
    /// Returns `None` for a zero denominator.
    pub fn new(numerator: BigUint, denominator: BigUint) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        Some(Self { numerator, denominator })
    }

    pub fn numerator(&self) -> &BigUint {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigUint {
        &self.denominator
    }

    /// Lossy conversion, for logging only.
    pub fn to_f64(&self) -> f64 {
        ratio_to_f64(&self.numerator, &self.denominator)
    }
}

/// Prices of both tokens of a pool, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpPrices {
    pub price0: LpPrice,
    pub price1: LpPrice,
}

impl LpPrices {
    /// Derives prices from a pool's reserves and LP total supply.
    pub fn from_reserves(
        pool: Address,
        reserves: &PoolReserves,
        total_supply: &BigUint,
    ) -> Result<Self, CycleError> {
        let half_supply = total_supply / 2u32;
        let price = |reserve: &BigUint, index| {
            LpPrice::new(half_supply.clone(), reserve.clone())
                .ok_or(CycleError::PricingPrecondition { pool, index })
        };
        Ok(Self { price0: price(&reserves.reserve0, 0)?, price1: price(&reserves.reserve1, 1)? })
    }

    /// Naive LP tokens for depositing `amount0` and `amount1`: `amount0 * price0 + amount1 *
    /// price1`, kept exact.
    pub fn estimate_liquidity(&self, amount0: &BigUint, amount1: &BigUint) -> LiquidityEstimate {
        let (p0, p1) = (&self.price0, &self.price1);
        let numerator = amount0 * &p0.numerator * &p1.denominator +
            amount1 * &p1.numerator * &p0.denominator;
        let denominator = &p0.denominator * &p1.denominator;
        LiquidityEstimate { numerator, denominator }
    }
}

/// An exact, possibly fractional, amount of LP tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityEstimate {
    numerator: BigUint,
    denominator: BigUint,
}

impl LiquidityEstimate {
    /// The estimate reduced by `bps` basis points, then truncated to whole LP units.
    pub fn min_accepted(&self, bps: u32) -> BigUint {
        apply_haircut(&self.numerator, bps) / &self.denominator
    }

    /// Lossy conversion, for logging only.
    pub fn to_f64(&self) -> f64 {
        ratio_to_f64(&self.numerator, &self.denominator)
    }
}

fn ratio_to_f64(numerator: &BigUint, denominator: &BigUint) -> f64 {
    match (numerator.to_f64(), denominator.to_f64()) {
        (Some(n), Some(d)) => n / d,
        _ => f64::NAN,
    }
}

/// Reads the state a pool's LP prices derive from.
pub struct PoolPriceEstimator<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ChainClient + ?Sized> PoolPriceEstimator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Prices valid at the instant of the read. Nothing is cached between calls.
    #[instrument(level = "debug", skip(self))]
    pub async fn lp_prices(&self, pool: Address) -> Result<LpPrices, CycleError> {
        let reserves = self.client.get_reserves(pool).await?;
        let total_supply = self.client.total_supply(pool).await?;

        let prices = LpPrices::from_reserves(pool, &reserves, &total_supply)?;
        debug!(
            %pool,
            %total_supply,
            price0 = prices.price0.to_f64(),
            price1 = prices.price1.to_f64(),
            "Estimated LP prices"
        );
        Ok(prices)
    }
}
