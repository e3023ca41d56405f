use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use tracing::{info, instrument, warn};

use crate::{
    approval::ApprovalManager,
    calldata::{deposit_data, withdrawal_data},
    config::LiquidityConfig,
    errors::{CycleError, CycleFailure},
    models::{
        ContractCall, CycleReport, DepositRequest, PoolTokens, TokenAmount, TransactionJournal,
        TransactionKind, WithdrawalRequest,
    },
    pricing::PoolPriceEstimator,
    traits::{ChainClient, Pause},
    transaction::{send_and_confirm, GasStrategy},
};

/// Runs deposit-then-withdraw cycles for the signer of `client`.
pub struct LiquidityOrchestrator<C: ?Sized> {
    client: Arc<C>,
    pause: Arc<dyn Pause>,
    config: LiquidityConfig,
    approvals: ApprovalManager<C>,
    prices: PoolPriceEstimator<C>,
}

impl<C: ChainClient + ?Sized> LiquidityOrchestrator<C> {
    pub fn new(
        client: Arc<C>,
        pause: Arc<dyn Pause>,
        config: LiquidityConfig,
    ) -> Result<Self, CycleError> {
        config.validate()?;
        let approvals = ApprovalManager::new(
            client.clone(),
            pause.clone(),
            config.router,
            config.approvals.clone(),
            config.delays.approval_settle(),
        );
        let prices = PoolPriceEstimator::new(client.clone());
        Ok(Self { client, pause, config, approvals, prices })
    }

    /// Looks up the pool for a pair and orders the pair after the pool's `token0`.
    pub async fn resolve_pool(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<PoolTokens, CycleError> {
        let pool = self
            .client
            .get_pool(self.config.factory, token_a, token_b)
            .await?;
        if pool == Address::ZERO {
            return Err(CycleError::PoolNotFound { token_a, token_b });
        }
        let token0 = self.client.token0(pool).await?;
        let tokens = PoolTokens::resolve(pool, token0, token_a, token_b)?;
        info!(%pool, token0 = %tokens.token0, token1 = %tokens.token1, "Resolved pool");
        Ok(tokens)
    }

    /// Deposits the signer's whole balance of both tokens into their pool and immediately burns
    /// the minted LP tokens again.
    ///
    /// Nothing is rolled back on failure. The returned [`CycleFailure`] lists every transaction
    /// that reached finality, so a deposit without a matching withdrawal can be spotted.
    #[instrument(skip(self), fields(signer = %self.client.signer()))]
    pub async fn run_cycle(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<CycleReport, CycleFailure> {
        let mut journal = TransactionJournal::default();
        match self
            .cycle(token_a, token_b, &mut journal)
            .await
        {
            Ok(report) => Ok(report),
            Err(error) => {
                if journal
                    .entries()
                    .iter()
                    .any(|tx| tx.kind == TransactionKind::Deposit)
                {
                    warn!(%error, "Cycle failed after depositing, LP position may be outstanding");
                }
                Err(CycleFailure { error, completed: journal.into_inner() })
            }
        }
    }

    async fn cycle(
        &self,
        token_a: Address,
        token_b: Address,
        journal: &mut TransactionJournal,
    ) -> Result<CycleReport, CycleError> {
        let tokens = self
            .resolve_pool(token_a, token_b)
            .await?;
        let pool = tokens.pool;
        let reserves = self.client.get_reserves(pool).await?;
        info!(%pool, reserve0 = %reserves.reserve0, reserve1 = %reserves.reserve1, "Pool reserves");

        let amount0 = self
            .approvals
            .balance_with_allowance(tokens.token0, journal)
            .await?;
        let amount1 = self
            .approvals
            .balance_with_allowance(tokens.token1, journal)
            .await?;

        let prices = self.prices.lp_prices(pool).await?;
        let estimate = prices.estimate_liquidity(&amount0, &amount1);
        let min_liquidity = estimate.min_accepted(self.config.slippage.deposit_bps);
        info!(
            naive_liquidity = estimate.to_f64(),
            %min_liquidity,
            "Estimated LP tokens to mint"
        );

        let signer = self.client.signer();
        let deposit = ContractCall::AddLiquidity {
            router: self.config.router,
            request: DepositRequest {
                pool,
                inputs: vec![
                    TokenAmount::new(tokens.token0, amount0.clone()),
                    TokenAmount::new(tokens.token1, amount1.clone()),
                ],
                data: deposit_data(signer),
                min_liquidity: min_liquidity.clone(),
                callback: Address::ZERO,
                callback_data: Bytes::new(),
            },
        };
        let deposit_tx =
            send_and_confirm(self.client.as_ref(), &deposit, GasStrategy::CURRENT_PRICE)
                .await?
                .hash;
        journal.record(TransactionKind::Deposit, deposit.target(), deposit_tx);
        info!(tx_hash = %deposit_tx, "Deposit confirmed");

        self.pause
            .pause(self.config.delays.deposit_settle())
            .await;

        let liquidity = self
            .approvals
            .balance_with_allowance(pool, journal)
            .await?;
        let slippage = self.config.slippage;
        let min_withdrawn = [slippage.min_withdrawn(&amount0), slippage.min_withdrawn(&amount1)];

        let withdrawal = ContractCall::BurnLiquidity {
            router: self.config.router,
            request: WithdrawalRequest {
                pool,
                liquidity: liquidity.clone(),
                data: withdrawal_data(signer, self.config.withdraw_mode),
                min_amounts: min_withdrawn.to_vec(),
                callback: Address::ZERO,
                callback_data: Bytes::new(),
            },
        };
        let withdraw_tx = send_and_confirm(
            self.client.as_ref(),
            &withdrawal,
            GasStrategy::CURRENT_PRICE.with_buffer(slippage.burn_gas_buffer_bps),
        )
        .await?
        .hash;
        journal.record(TransactionKind::Withdraw, withdrawal.target(), withdraw_tx);
        info!(%deposit_tx, %withdraw_tx, liquidity = %liquidity, "Cycle completed");

        Ok(CycleReport {
            pool,
            token0: tokens.token0,
            token1: tokens.token1,
            deposited: [amount0, amount1],
            min_liquidity,
            liquidity_burned: liquidity,
            min_withdrawn,
            deposit_tx,
            withdraw_tx,
            transactions: journal.entries().to_vec(),
        })
    }
}
