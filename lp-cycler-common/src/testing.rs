//! In-memory ledger implementing [`ChainClient`], for exercising the cycle without a node.
//!
//! Pools mint and burn with a constant product, fee-less rule, approvals and transfers are
//! checked like an ERC-20 would, and every estimate, submission, confirmation and pause is
//! recorded as a [`ChainEvent`] in one shared log.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use alloy_primitives::{Address, TxHash, B256};
use async_trait::async_trait;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::{
    errors::ChainError,
    models::{
        ContractCall, GasParams, PendingTransaction, PoolReserves, TransactionReceipt,
    },
    traits::{ChainClient, Pause},
};

pub const DEFAULT_GAS_ESTIMATE: u64 = 150_000;
pub const DEFAULT_GAS_PRICE: u128 = 250_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    Estimate(ContractCall),
    Submit { call: ContractCall, gas: GasParams },
    Finalized(TxHash),
    Pause(Duration),
}

/// Failure injected for a named method, e.g. `"balanceOf"` or `"burnLiquidity"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Any call to the method fails as if the node was unreachable.
    Unavailable,
    /// Gas estimation for the method fails.
    Estimation,
    /// The transaction is mined but reverts.
    Revert,
}

#[derive(Debug, Clone)]
struct PoolState {
    token0: Address,
    token1: Address,
    reserve0: BigUint,
    reserve1: BigUint,
    total_supply: BigUint,
}

impl PoolState {
    fn index_of(&self, token: Address) -> Option<usize> {
        if token == self.token0 {
            Some(0)
        } else if token == self.token1 {
            Some(1)
        } else {
            None
        }
    }

    /// Grows the supply by the relative growth of `sqrt(reserve0 * reserve1)`.
    fn mint(&mut self, amounts: &[BigUint; 2]) -> BigUint {
        let k = (&self.reserve0 * &self.reserve1).sqrt();
        self.reserve0 += &amounts[0];
        self.reserve1 += &amounts[1];
        let grown = (&self.reserve0 * &self.reserve1).sqrt();
        let minted = if self.total_supply.is_zero() || k.is_zero() {
            grown
        } else {
            &self.total_supply * (grown - &k) / &k
        };
        self.total_supply += &minted;
        minted
    }

    fn burn(&mut self, liquidity: &BigUint) -> [BigUint; 2] {
        let amount0 = liquidity * &self.reserve0 / &self.total_supply;
        let amount1 = liquidity * &self.reserve1 / &self.total_supply;
        self.reserve0 -= &amount0;
        self.reserve1 -= &amount1;
        self.total_supply -= liquidity;
        [amount0, amount1]
    }
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    /// (factory, token_a, token_b) -> pool
    pools: HashMap<(Address, Address, Address), Address>,
    pool_states: HashMap<Address, PoolState>,
    balances: HashMap<(Address, Address), BigUint>,
    allowances: HashMap<(Address, Address, Address), BigUint>,
    symbols: HashMap<Address, String>,
    strict_approvals: HashSet<Address>,
}

impl Ledger {
    fn balance(&self, token: Address, owner: Address) -> BigUint {
        self.balances
            .get(&(token, owner))
            .cloned()
            .unwrap_or_default()
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> BigUint {
        self.allowances
            .get(&(token, owner, spender))
            .cloned()
            .unwrap_or_default()
    }

    fn credit(&mut self, token: Address, owner: Address, amount: &BigUint) {
        *self
            .balances
            .entry((token, owner))
            .or_default() += amount;
    }

    /// `transferFrom(owner, spender, amount)` semantics: checks and debits balance and allowance.
    fn spend(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: &BigUint,
    ) -> Result<(), String> {
        let balance = self.balance(token, owner);
        if &balance < amount {
            return Err(format!("transfer amount exceeds balance of {token}"));
        }
        let allowance = self.allowance(token, owner, spender);
        if &allowance < amount {
            return Err(format!("insufficient allowance of {token}"));
        }
        self.balances
            .insert((token, owner), balance - amount);
        self.allowances
            .insert((token, owner, spender), allowance - amount);
        Ok(())
    }

    fn execute(&mut self, signer: Address, call: &ContractCall) -> Result<(), String> {
        match call {
            ContractCall::Approve { token, spender, amount } => {
                let current = self.allowance(*token, signer, *spender);
                if self.strict_approvals.contains(token) && !current.is_zero() && !amount.is_zero()
                {
                    return Err("approve from non-zero to non-zero allowance".to_string());
                }
                self.allowances
                    .insert((*token, signer, *spender), amount.clone());
                Ok(())
            }
            ContractCall::AddLiquidity { router, request } => {
                let mut state = self
                    .pool_states
                    .get(&request.pool)
                    .cloned()
                    .ok_or("unknown pool")?;
                let mut amounts = [BigUint::zero(), BigUint::zero()];
                for input in &request.inputs {
                    let index = state
                        .index_of(input.token)
                        .ok_or("token not in pool")?;
                    self.spend(input.token, signer, *router, &input.amount)?;
                    amounts[index] += &input.amount;
                }
                let minted = state.mint(&amounts);
                if minted.is_zero() || minted < request.min_liquidity {
                    return Err("insufficient liquidity minted".to_string());
                }
                self.credit(request.pool, signer, &minted);
                self.pool_states
                    .insert(request.pool, state);
                Ok(())
            }
            ContractCall::BurnLiquidity { router, request } => {
                let mut state = self
                    .pool_states
                    .get(&request.pool)
                    .cloned()
                    .ok_or("unknown pool")?;
                if request.min_amounts.len() != 2 {
                    return Err("expected two minimum amounts".to_string());
                }
                self.spend(request.pool, signer, *router, &request.liquidity)?;
                let amounts = state.burn(&request.liquidity);
                if amounts
                    .iter()
                    .zip(&request.min_amounts)
                    .any(|(amount, min)| amount < min)
                {
                    return Err("insufficient output amount".to_string());
                }
                self.credit(state.token0, signer, &amounts[0]);
                self.credit(state.token1, signer, &amounts[1]);
                self.pool_states
                    .insert(request.pool, state);
                Ok(())
            }
        }
    }
}

#[derive(Debug)]
struct Inner {
    ledger: Ledger,
    events: Vec<ChainEvent>,
    pending: HashMap<TxHash, ContractCall>,
    failures: HashMap<&'static str, Failure>,
    nonce: u64,
    gas_estimate: u64,
    gas_price: u128,
}

/// A simulated chain for a single signer. Clones share the same ledger and event log.
#[derive(Debug, Clone)]
pub struct SimulatedChain {
    signer: Address,
    inner: Arc<Mutex<Inner>>,
}

impl SimulatedChain {
    pub fn new(signer: Address) -> Self {
        let inner = Inner {
            ledger: Ledger::default(),
            events: Vec::new(),
            pending: HashMap::new(),
            failures: HashMap::new(),
            nonce: 0,
            gas_estimate: DEFAULT_GAS_ESTIMATE,
            gas_price: DEFAULT_GAS_PRICE,
        };
        Self { signer, inner: Arc::new(Mutex::new(inner)) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .expect("simulated chain lock poisoned")
    }

    /// Registers a pool with the factory, for both orderings of the pair.
    pub fn with_pool(
        self,
        factory: Address,
        pool: Address,
        (token0, token1): (Address, Address),
        (reserve0, reserve1): (u128, u128),
        total_supply: u128,
    ) -> Self {
        {
            let mut inner = self.lock();
            let ledger = &mut inner.ledger;
            ledger
                .pools
                .insert((factory, token0, token1), pool);
            ledger
                .pools
                .insert((factory, token1, token0), pool);
            ledger.pool_states.insert(
                pool,
                PoolState {
                    token0,
                    token1,
                    reserve0: reserve0.into(),
                    reserve1: reserve1.into(),
                    total_supply: total_supply.into(),
                },
            );
            ledger
                .symbols
                .insert(pool, "LP".to_string());
        }
        self
    }

    /// Registers a token and the signer's balance of it.
    pub fn with_token(self, token: Address, symbol: &str, balance: u128) -> Self {
        {
            let mut inner = self.lock();
            inner
                .ledger
                .symbols
                .insert(token, symbol.to_string());
            inner
                .ledger
                .balances
                .insert((token, self.signer), balance.into());
        }
        self
    }

    /// Pre-existing allowance of the signer towards `spender`.
    pub fn with_allowance(self, token: Address, spender: Address, amount: u128) -> Self {
        self.lock()
            .ledger
            .allowances
            .insert((token, self.signer, spender), amount.into());
        self
    }

    /// Makes `approve` revert on any nonzero to nonzero allowance change, like USDT does.
    pub fn with_strict_approvals(self, token: Address) -> Self {
        self.lock()
            .ledger
            .strict_approvals
            .insert(token);
        self
    }

    pub fn with_failure(self, method: &'static str, failure: Failure) -> Self {
        self.lock()
            .failures
            .insert(method, failure);
        self
    }

    pub fn with_gas_estimate(self, gas: u64) -> Self {
        self.lock().gas_estimate = gas;
        self
    }

    /// A [`Pause`] recording into this chain's event log.
    pub fn pauser(&self) -> Arc<RecordingPause> {
        Arc::new(RecordingPause { inner: self.inner.clone() })
    }

    pub fn events(&self) -> Vec<ChainEvent> {
        self.lock().events.clone()
    }

    /// Every submitted call with its gas settings, in order.
    pub fn submissions(&self) -> Vec<(ContractCall, GasParams)> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                ChainEvent::Submit { call, gas } => Some((call.clone(), *gas)),
                _ => None,
            })
            .collect()
    }

    pub fn balance(&self, token: Address, owner: Address) -> BigUint {
        self.lock().ledger.balance(token, owner)
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> BigUint {
        self.lock()
            .ledger
            .allowance(token, owner, spender)
    }

    fn check(&self, method: &'static str) -> Result<(), ChainError> {
        match self.lock().failures.get(method) {
            Some(Failure::Unavailable) => {
                Err(ChainError::Unavailable(format!("{method}: connection refused")))
            }
            _ => Ok(()),
        }
    }

    fn pool_state(&self, pool: Address) -> Result<PoolState, ChainError> {
        self.lock()
            .ledger
            .pool_states
            .get(&pool)
            .cloned()
            .ok_or_else(|| {
                ChainError::Unavailable(format!("execution reverted: {pool} is no pool"))
            })
    }
}

#[async_trait]
impl ChainClient for SimulatedChain {
    fn signer(&self) -> Address {
        self.signer
    }

    async fn get_pool(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ChainError> {
        self.check("getPool")?;
        Ok(self
            .lock()
            .ledger
            .pools
            .get(&(factory, token_a, token_b))
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn get_reserves(&self, pool: Address) -> Result<PoolReserves, ChainError> {
        self.check("getReserves")?;
        let state = self.pool_state(pool)?;
        Ok(PoolReserves { reserve0: state.reserve0, reserve1: state.reserve1 })
    }

    async fn token0(&self, pool: Address) -> Result<Address, ChainError> {
        self.check("token0")?;
        Ok(self.pool_state(pool)?.token0)
    }

    async fn total_supply(&self, pool: Address) -> Result<BigUint, ChainError> {
        self.check("totalSupply")?;
        Ok(self.pool_state(pool)?.total_supply)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<BigUint, ChainError> {
        self.check("balanceOf")?;
        Ok(self.balance(token, owner))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<BigUint, ChainError> {
        self.check("allowance")?;
        Ok(SimulatedChain::allowance(self, token, owner, spender))
    }

    async fn symbol(&self, token: Address) -> Result<String, ChainError> {
        self.check("symbol")?;
        self.lock()
            .ledger
            .symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainError::InvalidResponse(format!("{token} has no symbol")))
    }

    async fn estimate_gas(
        &self,
        call: &ContractCall,
        _gas_price: Option<u128>,
    ) -> Result<u64, ChainError> {
        let mut inner = self.lock();
        inner
            .events
            .push(ChainEvent::Estimate(call.clone()));
        let estimation_error =
            |reason: String| ChainError::Estimation { call: call.method().to_string(), reason };
        match inner.failures.get(call.method()) {
            Some(Failure::Unavailable) | Some(Failure::Estimation) => {
                return Err(estimation_error("injected failure".to_string()));
            }
            _ => {}
        }
        let mut dry_run = inner.ledger.clone();
        dry_run
            .execute(self.signer, call)
            .map_err(|reason| estimation_error(format!("execution reverted: {reason}")))?;
        Ok(inner.gas_estimate)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.check("gasPrice")?;
        Ok(self.lock().gas_price)
    }

    async fn submit(
        &self,
        call: &ContractCall,
        gas: GasParams,
    ) -> Result<PendingTransaction, ChainError> {
        let mut inner = self.lock();
        if let Some(Failure::Unavailable) = inner.failures.get(call.method()) {
            return Err(ChainError::Unavailable(format!("{}: connection refused", call.method())));
        }
        inner.nonce += 1;
        let hash = B256::left_padding_from(&inner.nonce.to_be_bytes());
        inner
            .events
            .push(ChainEvent::Submit { call: call.clone(), gas });
        inner.pending.insert(hash, call.clone());
        Ok(PendingTransaction { hash })
    }

    async fn await_finality(
        &self,
        pending: PendingTransaction,
    ) -> Result<TransactionReceipt, ChainError> {
        let mut inner = self.lock();
        let call = inner
            .pending
            .remove(&pending.hash)
            .ok_or_else(|| ChainError::InvalidResponse(format!("unknown tx {}", pending.hash)))?;
        if let Some(Failure::Revert) = inner.failures.get(call.method()) {
            return Err(ChainError::Reverted(pending.hash));
        }
        let mut next = inner.ledger.clone();
        next.execute(self.signer, &call)
            .map_err(|_| ChainError::Reverted(pending.hash))?;
        inner.ledger = next;
        inner
            .events
            .push(ChainEvent::Finalized(pending.hash));
        Ok(TransactionReceipt {
            hash: pending.hash,
            block_number: Some(inner.nonce),
            gas_used: inner.gas_estimate,
        })
    }
}

/// [`Pause`] that records the requested duration instead of sleeping.
#[derive(Debug)]
pub struct RecordingPause {
    inner: Arc<Mutex<Inner>>,
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.inner
            .lock()
            .expect("simulated chain lock poisoned")
            .events
            .push(ChainEvent::Pause(duration));
    }
}
