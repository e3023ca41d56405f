use std::str::FromStr;

use alloy::{
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    primitives::Address,
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use lp_cycler_common::{
    errors::ChainError,
    models::{ContractCall, GasParams, PendingTransaction, PoolReserves, TransactionReceipt},
    traits::ChainClient,
};
use num_bigint::BigUint;
use tracing::{debug, instrument};

use crate::{
    abi::{encode_call, IPool, IPoolFactory, IERC20},
    errors::{extract_error_chain, RPCError, RequestError, RpcResultExt},
    u256_to_biguint,
};

const REQUIRED_CONFIRMATIONS: u64 = 1;

/// Chain client signing with a local private key and talking JSON-RPC over HTTP.
///
/// Nonce, chain id and, unless given explicitly, fees are filled in by the provider. It is cheap
/// to clone, as the provider is internally reference counted.
#[derive(Clone)]
pub struct EthereumChainClient {
    provider: DynProvider,
    signer: Address,
    url: String,
}

impl EthereumChainClient {
    pub fn new(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self, RPCError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| RPCError::SetupError(format!("Invalid RPC URL: {e}")))?;
        let address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self { provider, signer: address, url: rpc_url.to_string() })
    }

    /// Same as [`EthereumChainClient::new`], from a hex encoded private key.
    pub fn from_private_key(rpc_url: &str, private_key: &str) -> Result<Self, RPCError> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| RPCError::SetupError(format!("Invalid private key: {e}")))?;
        Self::new(rpc_url, signer)
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    fn transaction_request(&self, call: &ContractCall) -> Result<TransactionRequest, RPCError> {
        Ok(TransactionRequest::default()
            .with_from(self.signer)
            .with_to(call.target())
            .with_input(encode_call(call)?))
    }
}

#[async_trait]
impl ChainClient for EthereumChainClient {
    fn signer(&self) -> Address {
        self.signer
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_pool(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ChainError> {
        let pool = IPoolFactory::new(factory, self.provider.clone())
            .getPool(token_a, token_b)
            .call()
            .await
            .with_rpc_context(|| format!("Failed to get pool for {token_a} / {token_b}"))?;
        Ok(pool)
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_reserves(&self, pool: Address) -> Result<PoolReserves, ChainError> {
        let reserves = IPool::new(pool, self.provider.clone())
            .getReserves()
            .call()
            .await
            .with_rpc_context(|| format!("Failed to get reserves of {pool}"))?;
        Ok(PoolReserves::new(
            u256_to_biguint(reserves.reserve0),
            u256_to_biguint(reserves.reserve1),
        ))
    }

    #[instrument(level = "debug", skip(self))]
    async fn token0(&self, pool: Address) -> Result<Address, ChainError> {
        let token0 = IPool::new(pool, self.provider.clone())
            .token0()
            .call()
            .await
            .with_rpc_context(|| format!("Failed to get token0 of {pool}"))?;
        Ok(token0)
    }

    #[instrument(level = "debug", skip(self))]
    async fn total_supply(&self, pool: Address) -> Result<BigUint, ChainError> {
        let supply = IPool::new(pool, self.provider.clone())
            .totalSupply()
            .call()
            .await
            .with_rpc_context(|| format!("Failed to get total supply of {pool}"))?;
        Ok(u256_to_biguint(supply))
    }

    #[instrument(level = "debug", skip(self))]
    async fn balance_of(&self, token: Address, owner: Address) -> Result<BigUint, ChainError> {
        let balance = IERC20::new(token, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .with_rpc_context(|| format!("Failed to get balance of {owner} for {token}"))?;
        Ok(u256_to_biguint(balance))
    }

    #[instrument(level = "debug", skip(self))]
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<BigUint, ChainError> {
        let allowance = IERC20::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .with_rpc_context(|| format!("Failed to get allowance of {spender} for {token}"))?;
        Ok(u256_to_biguint(allowance))
    }

    #[instrument(level = "debug", skip(self))]
    async fn symbol(&self, token: Address) -> Result<String, ChainError> {
        let symbol = IERC20::new(token, self.provider.clone())
            .symbol()
            .call()
            .await
            .with_rpc_context(|| format!("Failed to get symbol of {token}"))?;
        Ok(symbol)
    }

    #[instrument(level = "debug", skip(self, call), fields(call = %call))]
    async fn estimate_gas(
        &self,
        call: &ContractCall,
        gas_price: Option<u128>,
    ) -> Result<u64, ChainError> {
        let estimation_error = |err: RPCError| ChainError::Estimation {
            call: call.method().to_string(),
            reason: extract_error_chain(&err),
        };
        let mut request = self
            .transaction_request(call)
            .map_err(estimation_error)?;
        if let Some(gas_price) = gas_price {
            request = request.with_gas_price(gas_price);
        }
        let gas = self
            .provider
            .estimate_gas(request)
            .await
            .rpc_context("Failed to estimate gas")
            .map_err(estimation_error)?;
        debug!(gas, "Estimated gas");
        Ok(gas)
    }

    #[instrument(level = "debug", skip(self))]
    async fn gas_price(&self) -> Result<u128, ChainError> {
        Ok(self
            .provider
            .get_gas_price()
            .await
            .rpc_context("Failed to get gas price")?)
    }

    #[instrument(level = "debug", skip(self, call), fields(call = %call))]
    async fn submit(
        &self,
        call: &ContractCall,
        gas: GasParams,
    ) -> Result<PendingTransaction, ChainError> {
        let mut request = self
            .transaction_request(call)?
            .with_gas_limit(gas.gas_limit);
        if let Some(gas_price) = gas.gas_price {
            request = request.with_gas_price(gas_price);
        }

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .with_rpc_context(|| format!("Failed to submit {}", call.method()))?;
        let hash = *pending.tx_hash();
        debug!(%hash, "Submitted transaction");
        Ok(PendingTransaction { hash })
    }

    #[instrument(level = "debug", skip(self))]
    async fn await_finality(
        &self,
        pending: PendingTransaction,
    ) -> Result<TransactionReceipt, ChainError> {
        let hash = pending.hash;
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), hash)
            .with_required_confirmations(REQUIRED_CONFIRMATIONS)
            .get_receipt()
            .await
            .map_err(|e| {
                RPCError::RequestError(RequestError::Other(format!(
                    "Failed to await transaction {hash}: {e}"
                )))
            })?;

        if !ReceiptResponse::status(&receipt) {
            return Err(RPCError::Reverted(hash).into());
        }
        Ok(TransactionReceipt {
            hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, TxHash, B256};
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use num_bigint::BigUint;
    use serde_json::{json, Value};
    use tracing_test::traced_test;

    use super::*;

    // Anvil's first development account.
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_SIGNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const TOKEN: Address = address!("0000000000000000000000000000000000000001");
    const POOL: Address = address!("00000000000000000000000000000000000000aa");

    fn client(server: &ServerGuard) -> EthereumChainClient {
        EthereumChainClient::from_private_key(&server.url(), TEST_KEY)
            .expect("Failed to create client")
    }

    async fn mock_result(server: &mut ServerGuard, method: &str, result: &str) -> Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":0,"result":"{result}"}}"#))
            .create_async()
            .await
    }

    async fn mock_json(server: &mut ServerGuard, method: &str, result: Value) -> Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "jsonrpc": "2.0", "id": 0, "result": result }).to_string())
            .create_async()
            .await
    }

    fn receipt(hash: TxHash, status: &str) -> Value {
        json!({
            "transactionHash": hash,
            "transactionIndex": "0x0",
            "blockHash": B256::with_last_byte(0xbb),
            "blockNumber": "0x10",
            "from": TEST_SIGNER,
            "to": TOKEN,
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "contractAddress": null,
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "status": status,
            "type": "0x0"
        })
    }

    fn approve_call() -> ContractCall {
        ContractCall::Approve { token: TOKEN, spender: POOL, amount: BigUint::from(100u32) }
    }

    async fn mock_error(server: &mut ServerGuard, method: &str, message: &str) -> Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"jsonrpc":"2.0","id":0,"error":{{"code":-32000,"message":"{message}"}}}}"#
            ))
            .create_async()
            .await
    }

    #[test]
    fn test_from_private_key_derives_signer() {
        let client =
            EthereumChainClient::from_private_key("https://mainnet.era.zksync.io", TEST_KEY)
                .unwrap();

        assert_eq!(client.signer(), TEST_SIGNER);
        assert_eq!(client.get_url(), "https://mainnet.era.zksync.io");
    }

    #[test]
    fn test_from_private_key_accepts_prefix_and_whitespace() {
        let client = EthereumChainClient::from_private_key(
            "https://mainnet.era.zksync.io",
            &format!("0x{TEST_KEY}\n"),
        )
        .unwrap();

        assert_eq!(client.signer(), TEST_SIGNER);
    }

    #[test]
    fn test_invalid_setup_is_rejected() {
        let invalid_url = EthereumChainClient::from_private_key("invalid_url", TEST_KEY);
        let invalid_key = EthereumChainClient::from_private_key("https://example.com", "0x1234");

        assert!(matches!(invalid_url, Err(RPCError::SetupError(_))));
        assert!(matches!(invalid_key, Err(RPCError::SetupError(_))));
    }

    #[tokio::test]
    async fn test_gas_price() {
        let mut server = Server::new_async().await;
        let mock = mock_result(&mut server, "eth_gasPrice", "0x3b9aca00").await;

        let gas_price = client(&server).gas_price().await.unwrap();

        assert_eq!(gas_price, 1_000_000_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_balance_of() {
        let mut server = Server::new_async().await;
        let mock = mock_result(
            &mut server,
            "eth_call",
            "0x00000000000000000000000000000000000000000000000000000000000003e8",
        )
        .await;

        let balance = client(&server)
            .balance_of(TOKEN, TEST_SIGNER)
            .await
            .unwrap();

        assert_eq!(balance, BigUint::from(1_000u32));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_reserves() {
        let mut server = Server::new_async().await;
        let _mock = mock_result(
            &mut server,
            "eth_call",
            "0x00000000000000000000000000000000000000000000000000000000000003e8\
             00000000000000000000000000000000000000000000000000000000000007d0",
        )
        .await;

        let reserves = client(&server)
            .get_reserves(POOL)
            .await
            .unwrap();

        assert_eq!(reserves, PoolReserves::new(1_000u32, 2_000u32));
    }

    #[tokio::test]
    async fn test_symbol() {
        let mut server = Server::new_async().await;
        let _mock = mock_result(
            &mut server,
            "eth_call",
            "0x0000000000000000000000000000000000000000000000000000000000000020\
             0000000000000000000000000000000000000000000000000000000000000004\
             5553445400000000000000000000000000000000000000000000000000000000",
        )
        .await;

        let symbol = client(&server).symbol(TOKEN).await.unwrap();

        assert_eq!(symbol, "USDT");
    }

    #[tokio::test]
    async fn test_read_error_is_unavailable() {
        let mut server = Server::new_async().await;
        let _mock = mock_error(&mut server, "eth_call", "header not found").await;

        let err = client(&server)
            .token0(POOL)
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::Unavailable(msg) if msg.contains("header not found")));
    }

    #[tokio::test]
    async fn test_reverting_estimate_is_estimation_error() {
        let mut server = Server::new_async().await;
        let _mock = mock_error(&mut server, "eth_estimateGas", "execution reverted").await;

        let err = client(&server)
            .estimate_gas(&approve_call(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChainError::Estimation { call, reason }
                if call == "approve" && reason.contains("execution reverted")
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_estimate_gas() {
        let mut server = Server::new_async().await;
        let mock = mock_result(&mut server, "eth_estimateGas", "0x249f0").await;

        let gas = client(&server)
            .estimate_gas(&approve_call(), None)
            .await
            .unwrap();

        assert_eq!(gas, 150_000);
        assert!(logs_contain("Estimated gas"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_estimate_gas_carries_gas_price() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "method": "eth_estimateGas" })),
                Matcher::Regex(r#""gasPrice":"0x3b9aca00""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x249f0"}"#)
            .create_async()
            .await;

        let gas = client(&server)
            .estimate_gas(&approve_call(), Some(1_000_000_000))
            .await
            .unwrap();

        assert_eq!(gas, 150_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_signs_given_gas_params() {
        let mut server = Server::new_async().await;
        let hash = B256::with_last_byte(5);
        let _chain_id = mock_result(&mut server, "eth_chainId", "0x144").await;
        let _nonce = mock_result(&mut server, "eth_getTransactionCount", "0x0").await;
        // Legacy RLP: nonce 0, gas price 1 gwei, gas limit 165000, then the token as recipient.
        let raw_tx = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "method": "eth_sendRawTransaction" })),
                Matcher::Regex(
                    "80843b9aca00830284a8940000000000000000000000000000000000000001".to_string(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "jsonrpc": "2.0", "id": 0, "result": hash }).to_string())
            .create_async()
            .await;

        let pending = client(&server)
            .submit(
                &approve_call(),
                GasParams { gas_limit: 165_000, gas_price: Some(1_000_000_000) },
            )
            .await
            .unwrap();

        assert_eq!(pending, PendingTransaction { hash });
        raw_tx.assert_async().await;
    }

    #[tokio::test]
    async fn test_await_finality_returns_receipt() {
        let mut server = Server::new_async().await;
        let hash = B256::with_last_byte(5);
        let _block = mock_result(&mut server, "eth_blockNumber", "0x10").await;
        let _receipt =
            mock_json(&mut server, "eth_getTransactionReceipt", receipt(hash, "0x1")).await;

        let receipt = client(&server)
            .await_finality(PendingTransaction { hash })
            .await
            .unwrap();

        assert_eq!(receipt, TransactionReceipt { hash, block_number: Some(16), gas_used: 21_000 });
    }

    #[tokio::test]
    async fn test_failed_receipt_is_reverted() {
        let mut server = Server::new_async().await;
        let hash = B256::with_last_byte(5);
        let _block = mock_result(&mut server, "eth_blockNumber", "0x10").await;
        let _receipt =
            mock_json(&mut server, "eth_getTransactionReceipt", receipt(hash, "0x0")).await;

        let err = client(&server)
            .await_finality(PendingTransaction { hash })
            .await
            .unwrap_err();

        assert_eq!(err, ChainError::Reverted(hash));
    }

    #[tokio::test]
    #[ignore = "require RPC connection"]
    async fn test_get_pool_on_zksync_era() {
        let url = std::env::var("RPC_URL").expect("RPC_URL must be set for testing");
        let client = EthereumChainClient::from_private_key(&url, TEST_KEY).unwrap();
        // WETH / USDC.e
        let weth = address!("5AEa5775959fBC2557Cc8789bC1bf90A239D9a91");
        let usdc = address!("3355df6D4c9C3035724Fd0e3914dE96A5a83aaf4");

        let pool = client
            .get_pool(lp_cycler_common::config::DEFAULT_POOL_FACTORY, weth, usdc)
            .await
            .unwrap();
        let token0 = client.token0(pool).await.unwrap();

        assert_ne!(pool, Address::ZERO);
        assert!(token0 == weth || token0 == usdc);
    }
}
