// src/lib.rs
//! Client library for a tokenized-asset fund: wallet session state,
//! transaction confirmation with a timeout fallback, and on-chain snapshot
//! reconciliation over primary/secondary market contracts.

pub mod chain;
pub mod contracts;
pub mod core;
pub mod metadata;
pub mod refresh;
pub mod service;

pub use crate::chain::confirmation::{wait_for_transaction, DEFAULT_CONFIRMATION_TIMEOUT};
pub use crate::chain::ledger::{Ledger, PendingCall, TxOutcome, TxReceipt};
pub use crate::core::config::FundClientConfig;
pub use crate::core::errors::{ContractRule, FundClientError, RemoteFailure};
pub use crate::refresh::snapshot::{AssetInfo, Holding, Listing};
pub use crate::refresh::watcher::SnapshotWatcher;
pub use crate::service::FundService;
