use std::fmt;

use thiserror::Error;

/// EIP-1193 code a wallet provider returns when the user dismisses the
/// signing prompt.
const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1474 code for an execution revert carrying a reason string.
const CODE_EXECUTION_REVERTED: i64 = 3;

/// Maximum length of a raw remote message surfaced to the user when no
/// classification applies.
pub const UNCLASSIFIED_MESSAGE_LIMIT: usize = 50;

/// Business-rule violations reported by the fund contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRule {
    /// Caller lacks the role the contract requires for this operation.
    MissingRole,
    /// Share or token balance is short of the requested amount.
    InsufficientBalance,
    /// Payment-token allowance granted to the market is short.
    InsufficientAllowance,
    /// The primary market has fewer tokens available than requested.
    InsufficientAvailability,
    /// The secondary-market listing was already filled or cancelled.
    ListingNotActive,
}

impl ContractRule {
    pub fn user_message(&self) -> &'static str {
        match self {
            ContractRule::MissingRole => "You do not have the required role",
            ContractRule::InsufficientBalance => "Insufficient balance",
            ContractRule::InsufficientAllowance => "Payment allowance too low",
            ContractRule::InsufficientAvailability => "Not enough tokens available",
            ContractRule::ListingNotActive => "Listing is no longer active",
        }
    }
}

impl fmt::Display for ContractRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

/// Raw failure surfaced by a remote call, before classification.
///
/// `code` carries the structured JSON-RPC error code when the transport
/// exposed one; classification falls back to the message text otherwise.
#[derive(Debug, Clone)]
pub struct RemoteFailure {
    pub code: Option<i64>,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// A revert payload decoded into its reason string.
    pub fn revert(reason: impl Into<String>) -> Self {
        Self::new(Some(CODE_EXECUTION_REVERTED), reason)
    }
}

/// Error type for fund client operations.
#[derive(Debug, Error)]
pub enum FundClientError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Input validation errors caught before any remote call.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Wallet session errors (not connected, connector failure).
    #[error("Wallet session error: {0}")]
    Session(String),
    /// The user dismissed the signing prompt. Surfaced verbatim, never retried.
    #[error("Transaction rejected by user")]
    UserRejected,
    /// Neither the native wait nor the fallback receipt check resolved the
    /// transaction within the timeout. The transaction may still confirm later.
    #[error("Transaction not confirmed after {waited_ms} ms (tx: {hash})")]
    ConfirmationTimeout { hash: String, waited_ms: u64 },
    /// The ledger reported the transaction as mined but failed.
    #[error("Transaction reverted on-chain (tx: {hash})")]
    Reverted { hash: String },
    /// A contract-reported business-rule violation.
    #[error("{0}")]
    Rule(ContractRule),
    /// Ledger interaction errors (RPC transport, malformed responses).
    #[error("Ledger error: {0}")]
    Ledger(String),
    /// Snapshot refresh lifecycle errors (watcher already stopped).
    #[error("Refresh error: {0}")]
    Refresh(String),
    /// HTTP errors from the metadata endpoint.
    #[error("Network error: {0}")]
    Network(String),
    /// Anything the taxonomy could not classify; message already truncated.
    #[error("{0}")]
    Unclassified(String),
}

impl FundClientError {
    /// Classify a remote failure into the user-facing taxonomy.
    ///
    /// The structured error code wins over the message text; pattern
    /// matching on the text is the fallback for transports that only
    /// surface a flat string.
    pub fn classify(failure: RemoteFailure) -> Self {
        if failure.code == Some(CODE_USER_REJECTED) {
            return FundClientError::UserRejected;
        }

        let text = failure.message.to_lowercase();
        if text.contains("accesscontrolunauthorizedaccount") || text.contains("missing role") {
            return FundClientError::Rule(ContractRule::MissingRole);
        }
        if text.contains("insufficient allowance") || text.contains("insufficientallowance") {
            return FundClientError::Rule(ContractRule::InsufficientAllowance);
        }
        if text.contains("insufficient balance")
            || text.contains("insufficientbalance")
            || text.contains("exceeds balance")
        {
            return FundClientError::Rule(ContractRule::InsufficientBalance);
        }
        if text.contains("insufficient availability") || text.contains("not enough available") {
            return FundClientError::Rule(ContractRule::InsufficientAvailability);
        }
        if text.contains("listing not active") || text.contains("listing is not active") {
            return FundClientError::Rule(ContractRule::ListingNotActive);
        }
        if text.contains("user denied") || text.contains("rejected by user") {
            return FundClientError::UserRejected;
        }

        FundClientError::Unclassified(truncate_message(&failure.message))
    }

    /// Whether the failure is a timeout that left the transaction in an
    /// unknown-but-possibly-fine state.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FundClientError::ConfirmationTimeout { .. })
    }

    /// Whether retrying the same call can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FundClientError::Network(_)
                | FundClientError::Ledger(_)
                | FundClientError::ConfirmationTimeout { .. }
        )
    }
}

impl From<reqwest::Error> for FundClientError {
    fn from(err: reqwest::Error) -> Self {
        FundClientError::Network(err.to_string())
    }
}

fn truncate_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.chars().count() <= UNCLASSIFIED_MESSAGE_LIMIT {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(UNCLASSIFIED_MESSAGE_LIMIT).collect();
    format!("{}...", head)
}
