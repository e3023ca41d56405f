use tracing::debug;

use crate::{
    config::buffer_gas_limit,
    errors::{ChainError, CycleError},
    models::{ContractCall, GasParams, TransactionReceipt},
    traits::ChainClient,
};

/// How the gas limit and price of a submission are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GasStrategy {
    /// Extra gas on top of the raw estimate, in basis points.
    pub buffer_bps: u32,
    /// Attach the current network gas price instead of leaving fees to the client.
    pub explicit_price: bool,
}

impl GasStrategy {
    pub(crate) const CLIENT_FEES: GasStrategy =
        GasStrategy { buffer_bps: 0, explicit_price: false };
    pub(crate) const CURRENT_PRICE: GasStrategy =
        GasStrategy { buffer_bps: 0, explicit_price: true };

    pub(crate) fn with_buffer(self, buffer_bps: u32) -> Self {
        GasStrategy { buffer_bps, ..self }
    }
}

/// Estimates, submits and awaits a single call.
///
/// With an explicit price, the price is read first and both the estimate and the submission
/// use it. The estimate is taken right before submission. Any estimation failure, RPC failure
/// included, is reported as [`CycleError::Estimation`] since nothing was spent yet.
pub(crate) async fn send_and_confirm<C: ChainClient + ?Sized>(
    client: &C,
    call: &ContractCall,
    strategy: GasStrategy,
) -> Result<TransactionReceipt, CycleError> {
    let gas_price = if strategy.explicit_price { Some(client.gas_price().await?) } else { None };
    let estimate = client
        .estimate_gas(call, gas_price)
        .await
        .map_err(|err| match err {
            ChainError::Estimation { call, reason } => CycleError::Estimation { call, reason },
            other => CycleError::Estimation {
                call: call.method().to_string(),
                reason: other.to_string(),
            },
        })?;
    let gas = GasParams { gas_limit: buffer_gas_limit(estimate, strategy.buffer_bps), gas_price };
    debug!(%call, estimate, gas_limit = gas.gas_limit, ?gas_price, "Submitting transaction");

    let pending = client.submit(call, gas).await?;
    debug!(hash = %pending.hash, "Awaiting finality");
    let receipt = client.await_finality(pending).await?;
    debug!(
        hash = %receipt.hash,
        block_number = ?receipt.block_number,
        gas_used = receipt.gas_used,
        "Transaction finalized"
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, B256};
    use num_bigint::BigUint;
    use tracing_test::traced_test;

    use super::*;
    use crate::{models::TransactionReceipt, traits::MockChainClient};

    fn approve_call() -> ContractCall {
        ContractCall::Approve {
            token: address!("0000000000000000000000000000000000000001"),
            spender: address!("00000000000000000000000000000000000000bb"),
            amount: BigUint::from(10u32),
        }
    }

    #[tokio::test]
    async fn test_rpc_failure_during_estimate_is_estimation_error() {
        let mut client = MockChainClient::new();
        client
            .expect_estimate_gas()
            .returning(|_, _| Err(ChainError::Unavailable("timeout".into())));
        client.expect_submit().never();

        let err = send_and_confirm(&client, &approve_call(), GasStrategy::CLIENT_FEES)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CycleError::Estimation {
                call: "approve".into(),
                reason: "Remote unavailable: timeout".into()
            }
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_buffered_submission_with_current_price() {
        let hash = B256::with_last_byte(9);
        let mut client = MockChainClient::new();
        client
            .expect_estimate_gas()
            .withf(|_, gas_price| *gas_price == Some(42))
            .times(1)
            .returning(|_, _| Ok(200_000));
        client
            .expect_gas_price()
            .times(1)
            .returning(|| Ok(42));
        client
            .expect_submit()
            .withf(|_, gas| *gas == GasParams { gas_limit: 220_000, gas_price: Some(42) })
            .times(1)
            .returning(move |_, _| Ok(crate::models::PendingTransaction { hash }));
        client
            .expect_await_finality()
            .returning(|pending| {
                Ok(TransactionReceipt {
                    hash: pending.hash,
                    block_number: Some(16),
                    gas_used: 198_765,
                })
            });

        let receipt = send_and_confirm(
            &client,
            &approve_call(),
            GasStrategy::CURRENT_PRICE.with_buffer(1_000),
        )
        .await
        .unwrap();

        assert_eq!(receipt.hash, hash);
        assert!(logs_contain("gas_used=198765"));
    }

    #[tokio::test]
    async fn test_price_read_failure_skips_estimate() {
        let mut client = MockChainClient::new();
        client
            .expect_gas_price()
            .returning(|| Err(ChainError::Unavailable("timeout".into())));
        client.expect_estimate_gas().never();
        client.expect_submit().never();

        let err = send_and_confirm(&client, &approve_call(), GasStrategy::CURRENT_PRICE)
            .await
            .unwrap_err();

        assert_eq!(err, CycleError::from(ChainError::Unavailable("timeout".into())));
    }

    #[tokio::test]
    async fn test_client_fees_estimate_without_price() {
        let mut client = MockChainClient::new();
        client.expect_gas_price().never();
        client
            .expect_estimate_gas()
            .withf(|_, gas_price| gas_price.is_none())
            .times(1)
            .returning(|_, _| Ok(50_000));
        client
            .expect_submit()
            .withf(|_, gas| *gas == GasParams { gas_limit: 50_000, gas_price: None })
            .returning(|_, _| Ok(crate::models::PendingTransaction { hash: B256::ZERO }));
        client
            .expect_await_finality()
            .returning(|pending| {
                Ok(TransactionReceipt { hash: pending.hash, block_number: None, gas_used: 50_000 })
            });

        let receipt = send_and_confirm(&client, &approve_call(), GasStrategy::CLIENT_FEES)
            .await
            .unwrap();

        assert_eq!(receipt.gas_used, 50_000);
    }
}
