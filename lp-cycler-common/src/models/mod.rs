pub mod pool;
pub mod report;
pub mod request;
pub mod transaction;

pub use pool::{PoolReserves, PoolTokens};
pub use report::CycleReport;
pub use request::{ContractCall, DepositRequest, GasParams, TokenAmount, WithdrawalRequest};
pub use transaction::{
    CompletedTransaction, PendingTransaction, TransactionJournal, TransactionKind,
    TransactionReceipt,
};

/// Denominator of every basis point quantity.
pub const BPS_DENOMINATOR: u32 = 10_000;
