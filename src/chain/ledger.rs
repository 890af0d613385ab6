use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::FundClientError;

/// Immutable record of a finalized transaction. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// 0x-prefixed transaction hash.
    pub hash: String,
    /// Block the transaction was mined in. Absent while unmined.
    pub block_number: Option<u64>,
    /// Whether execution succeeded. A mined-but-reverted transaction
    /// carries `false`.
    pub success: bool,
}

/// A submitted call awaiting resolution. Target confirmation count is one.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub hash: String,
    pub submitted_at: DateTime<Utc>,
}

impl PendingCall {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), submitted_at: Utc::now() }
    }
}

/// Final disposition of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// Mined with at least one confirmation.
    Confirmed(TxReceipt),
    /// Not mined within the confirmation window; may still land later.
    Pending { hash: String },
}

impl TxOutcome {
    pub fn hash(&self) -> &str {
        match self {
            TxOutcome::Confirmed(receipt) => &receipt.hash,
            TxOutcome::Pending { hash } => hash,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxOutcome::Confirmed(_))
    }
}

/// Read capability over the remote ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Block until the transaction has one confirmation. Resolves with the
    /// receipt, or an error when the ledger reports the transaction failed.
    /// Callers bound the wait themselves; see `chain::confirmation`.
    async fn wait_for_confirmation(&self, hash: &str) -> Result<TxReceipt, FundClientError>;

    /// One-shot receipt lookup by hash. `Ok(None)` means not yet mined.
    async fn receipt_by_hash(&self, hash: &str) -> Result<Option<TxReceipt>, FundClientError>;

    /// Current chain head height.
    async fn block_number(&self) -> Result<u64, FundClientError>;

    /// Chain id reported by the remote endpoint.
    async fn chain_id(&self) -> Result<u64, FundClientError>;
}
