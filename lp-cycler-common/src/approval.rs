use std::{sync::Arc, time::Duration};

use alloy_primitives::{Address, TxHash};
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ApprovalPolicy,
    errors::CycleError,
    models::{ContractCall, TransactionJournal, TransactionKind},
    traits::{ChainClient, Pause},
    transaction::{send_and_confirm, GasStrategy},
};

/// Keeps a spender's allowance over the signer's tokens at least as large as the signer's
/// balance.
pub struct ApprovalManager<C: ?Sized> {
    client: Arc<C>,
    pause: Arc<dyn Pause>,
    spender: Address,
    policy: ApprovalPolicy,
    settle: Duration,
}

impl<C: ChainClient + ?Sized> ApprovalManager<C> {
    pub fn new(
        client: Arc<C>,
        pause: Arc<dyn Pause>,
        spender: Address,
        policy: ApprovalPolicy,
        settle: Duration,
    ) -> Self {
        Self { client, pause, spender, policy, settle }
    }

    /// Returns the signer's current balance of `token`, approving the spender for it first if
    /// the existing allowance falls short.
    ///
    /// The returned balance is the one read before any approval; it is not re-validated.
    /// Completed approvals are appended to `journal` as they reach finality.
    #[instrument(level = "debug", skip(self, journal), fields(spender = %self.spender))]
    pub async fn balance_with_allowance(
        &self,
        token: Address,
        journal: &mut TransactionJournal,
    ) -> Result<BigUint, CycleError> {
        let owner = self.client.signer();
        let balance = self
            .client
            .balance_of(token, owner)
            .await?;
        let allowance = self
            .client
            .allowance(token, owner, self.spender)
            .await?;
        debug!(%token, %balance, %allowance, "Read balance and allowance");

        if allowance >= balance {
            return Ok(balance);
        }

        let symbol = self.client.symbol(token).await?;

        if !allowance.is_zero() && self.policy.requires_revoke(&symbol) {
            warn!(%symbol, %allowance, "Token rejects nonzero allowance changes, revoking first");
            let hash = self
                .approve(token, BigUint::zero())
                .await?;
            journal.record(TransactionKind::Revoke, token, hash);
            info!(%symbol, tx_hash = %hash, "Revoked allowance");
            self.pause.pause(self.settle).await;
        }

        let hash = self
            .approve(token, balance.clone())
            .await?;
        journal.record(TransactionKind::Approve, token, hash);
        info!(%symbol, amount = %balance, tx_hash = %hash, "Approved allowance");
        self.pause.pause(self.settle).await;

        Ok(balance)
    }

    async fn approve(
        &self,
        token: Address,
        amount: BigUint,
    ) -> Result<TxHash, CycleError> {
        let call = ContractCall::Approve { token, spender: self.spender, amount };
        let receipt =
            send_and_confirm(self.client.as_ref(), &call, GasStrategy::CLIENT_FEES).await?;
        Ok(receipt.hash)
    }
}
