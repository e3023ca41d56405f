use alloy_primitives::{Address, TxHash};
use serde::Serialize;
use strum_macros::Display;

/// A submitted transaction that has not been awaited yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingTransaction {
    pub hash: TxHash,
}

/// A transaction that reached finality and succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    /// Allowance reset to zero ahead of a re-approval.
    Revoke,
    Approve,
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletedTransaction {
    pub kind: TransactionKind,
    /// Contract the transaction was sent to.
    pub target: Address,
    pub hash: TxHash,
}

/// Transactions that reached finality during one cycle, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionJournal(Vec<CompletedTransaction>);

impl TransactionJournal {
    pub fn record(&mut self, kind: TransactionKind, target: Address, hash: TxHash) {
        self.0
            .push(CompletedTransaction { kind, target, hash });
    }

    pub fn entries(&self) -> &[CompletedTransaction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<CompletedTransaction> {
        self.0
    }
}
