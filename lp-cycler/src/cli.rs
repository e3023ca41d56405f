use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use lp_cycler_common::{
    config::LiquidityConfig, errors::CycleError, orchestrator::LiquidityOrchestrator,
    pause::TokioPause, traits::ChainClient, Address,
};
use lp_cycler_ethereum::EthereumChainClient;
use tracing::{error, info};

const DEFAULT_RPC_URL: &str = "https://mainnet.era.zksync.io";

/// Deposits the signer's whole balance of two tokens into their pool, then withdraws the minted
/// LP tokens again.
///
/// Prints the cycle report as JSON on stdout. Logs go to stderr.
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct CliArgs {
    /// JSON-RPC endpoint of the chain.
    #[clap(long, default_value = DEFAULT_RPC_URL, env = "RPC_URL")]
    rpc_url: String,

    /// First token of the pair. The pool decides the actual token order.
    #[clap(long)]
    token_a: Address,

    /// Second token of the pair.
    #[clap(long)]
    token_b: Address,

    /// YAML file overriding contract addresses, slippage tolerances and delays.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Hex encoded private key of the signing account.
    /// Can be set with KEY env variable.
    #[clap(long, env = "KEY", hide_env_values = true)]
    key: Option<String>,

    /// Enable verbose logging: allowances, prices and gas estimates.
    #[clap(long)]
    verbose: bool,
}

impl CliArgs {
    fn private_key(&self) -> Result<&str, CycleError> {
        match self.key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CycleError::Configuration(
                "private key missing, set the KEY env variable".to_string(),
            )),
        }
    }
}

fn parse_config(raw: &str) -> Result<LiquidityConfig, CycleError> {
    serde_yaml::from_str(raw)
        .map_err(|e| CycleError::Configuration(format!("Invalid configuration: {e}")))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LiquidityConfig> {
    let Some(path) = path else {
        return Ok(LiquidityConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Ok(parse_config(&raw)?)
}

pub async fn run_cli() -> anyhow::Result<()> {
    let args: CliArgs = CliArgs::parse();

    // Setup Logging
    let log_level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set up logging subscriber")?;

    let config = load_config(args.config.as_ref())?;
    let client = EthereumChainClient::from_private_key(&args.rpc_url, args.private_key()?)?;
    info!(rpc_url = client.get_url(), signer = %client.signer(), "Starting liquidity cycle");

    let orchestrator =
        LiquidityOrchestrator::new(Arc::new(client), Arc::new(TokioPause), config)?;
    match orchestrator
        .run_cycle(args.token_a, args.token_b)
        .await
    {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(failure) => {
            for tx in &failure.completed {
                error!(
                    kind = %tx.kind,
                    target = %tx.target,
                    hash = %tx.hash,
                    "Transaction completed before failure"
                );
            }
            Err(failure.into())
        }
    }
}

#[cfg(test)]
mod cli_tests {
    use clap::Parser;
    use lp_cycler_common::config::DEFAULT_ROUTER;
    use rstest::rstest;

    use super::*;

    const TOKEN_A: &str = "0x5AEa5775959fBC2557Cc8789bC1bf90A239D9a91";
    const TOKEN_B: &str = "0x3355df6D4c9C3035724Fd0e3914dE96A5a83aaf4";

    #[test]
    fn test_cli_args() {
        let args = CliArgs::parse_from([
            "lp-cycler",
            "--rpc-url",
            "http://localhost:8545",
            "--token-a",
            TOKEN_A,
            "--token-b",
            TOKEN_B,
            "--config",
            "cycler.yaml",
            "--key",
            "0x01",
            "--verbose",
        ]);

        assert_eq!(args.rpc_url, "http://localhost:8545");
        assert_eq!(args.token_a, TOKEN_A.parse::<Address>().unwrap());
        assert_eq!(args.token_b, TOKEN_B.parse::<Address>().unwrap());
        assert_eq!(args.config, Some(PathBuf::from("cycler.yaml")));
        assert_eq!(args.private_key().unwrap(), "0x01");
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_rejects_malformed_token() {
        let result = CliArgs::try_parse_from([
            "lp-cycler",
            "--token-a",
            "not-an-address",
            "--token-b",
            TOKEN_B,
        ]);

        assert!(result.is_err());
    }

    #[rstest]
    #[case::unset(None)]
    #[case::blank(Some("  "))]
    fn test_missing_key_is_configuration_error(#[case] key: Option<&str>) {
        let mut args =
            CliArgs::parse_from(["lp-cycler", "--token-a", TOKEN_A, "--token-b", TOKEN_B]);
        args.key = key.map(str::to_string);

        assert!(matches!(args.private_key(), Err(CycleError::Configuration(_))));
    }

    #[test]
    fn test_config_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), LiquidityConfig::default());
    }

    #[test]
    fn test_parse_config() {
        let config = parse_config("slippage:\n  withdraw_bps: 100\nwithdraw_mode: 0\n").unwrap();

        assert_eq!(config.slippage.withdraw_bps, 100);
        assert_eq!(config.withdraw_mode, 0);
        assert_eq!(config.router, DEFAULT_ROUTER);
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let err = parse_config("slippage: [1, 2]").unwrap_err();

        assert!(matches!(err, CycleError::Configuration(_)));
    }

    #[test]
    fn test_unreadable_config_file_fails() {
        let missing = PathBuf::from("/nonexistent/lp-cycler.yaml");

        let err = load_config(Some(&missing)).unwrap_err();

        assert!(err
            .to_string()
            .contains("Failed to read config file"));
    }
}
