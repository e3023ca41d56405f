use std::{error::Error, fmt::Display};

use alloy::{
    contract::Error as ContractCallError,
    primitives::TxHash,
    transports::{RpcError as AlloyRpcError, TransportErrorKind},
};
use lp_cycler_common::errors::ChainError;
use thiserror::Error;

/// Alloy RPC error type alias for convenience.
pub(crate) type AlloyError = AlloyRpcError<TransportErrorKind>;

#[derive(Error, Debug)]
pub struct ReqwestError {
    pub msg: String,
    #[source]
    pub source: AlloyError,
}

impl Display for ReqwestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.msg, self.source)
    }
}

#[derive(Error, Debug)]
pub struct ContractError {
    pub msg: String,
    #[source]
    pub source: ContractCallError,
}

impl Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.msg, self.source)
    }
}

#[derive(Error, Debug)]
pub enum RequestError {
    Reqwest(ReqwestError),
    Other(String),
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Reqwest(e) => write!(f, "{}: {}", e.msg, e.source),
            RequestError::Other(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RPCError {
    #[error("RPC setup error: {0}")]
    SetupError(String),
    #[error("Request error: {0}")]
    RequestError(RequestError),
    #[error("Contract error: {0}")]
    ContractError(ContractError),
    #[error("Conversion error: {0}")]
    ConversionError(String),
    #[error("Transaction {0} reverted")]
    Reverted(TxHash),
    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl RPCError {
    pub(crate) fn from_alloy<S: ToString>(msg: S, error: AlloyError) -> Self {
        RPCError::RequestError(RequestError::Reqwest(ReqwestError {
            msg: msg.to_string(),
            source: error,
        }))
    }

    pub(crate) fn from_contract<S: ToString>(msg: S, error: ContractCallError) -> Self {
        RPCError::ContractError(ContractError { msg: msg.to_string(), source: error })
    }
}

impl From<RPCError> for ChainError {
    fn from(value: RPCError) -> Self {
        let message = extract_error_chain(&value);
        match value {
            RPCError::Reverted(hash) => ChainError::Reverted(hash),
            RPCError::ConversionError(_) => ChainError::InvalidResponse(message),
            RPCError::ContractError(ContractError {
                source: ContractCallError::TransportError(_), ..
            }) => ChainError::Unavailable(message),
            RPCError::ContractError(_) => ChainError::InvalidResponse(message),
            RPCError::SetupError(_) | RPCError::RequestError(_) | RPCError::UnknownError(_) => {
                ChainError::Unavailable(message)
            }
        }
    }
}

/// Extension trait for adding RPC context to Results containing Alloy errors.
///
/// Similar to `anyhow::Context`, this trait provides ergonomic error wrapping
/// that converts Alloy errors into `RPCError` with contextual messages.
///
/// # Example
/// ```ignore
/// use crate::errors::RpcResultExt;
///
/// // Instead of:
/// result.map_err(|e| RPCError::from_alloy(format!("Failed to get gas price"), e))?;
///
/// // You can write:
/// result.rpc_context("Failed to get gas price")?;
///
/// // Or with lazy evaluation (avoids format! on success path):
/// result.with_rpc_context(|| format!("Failed to read balance of {token}"))?;
/// ```
pub(crate) trait RpcResultExt<T> {
    /// Wraps the error with context, converting it to an `RPCError`.
    fn rpc_context<C: Display>(self, context: C) -> Result<T, RPCError>;

    /// Wraps the error with lazily-evaluated context.
    fn with_rpc_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T, RPCError>;
}

impl<T> RpcResultExt<T> for Result<T, AlloyError> {
    fn rpc_context<C: Display>(self, context: C) -> Result<T, RPCError> {
        self.map_err(|e| RPCError::from_alloy(context.to_string(), e))
    }

    fn with_rpc_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T, RPCError> {
        self.map_err(|e| RPCError::from_alloy(f().to_string(), e))
    }
}

impl<T> RpcResultExt<T> for Result<T, ContractCallError> {
    fn rpc_context<C: Display>(self, context: C) -> Result<T, RPCError> {
        self.map_err(|e| RPCError::from_contract(context.to_string(), e))
    }

    fn with_rpc_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T, RPCError> {
        self.map_err(|e| RPCError::from_contract(f().to_string(), e))
    }
}

/// Helper function to extract the full error chain including source errors
pub(crate) fn extract_error_chain(error: &dyn Error) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();

    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }

    if chain.len() == 1 {
        chain[0].clone()
    } else {
        format!("{} (caused by: {})", chain[0], chain[1..].join(" -> "))
    }
}
