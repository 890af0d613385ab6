//! Typed façades over the externally deployed fund contracts. Reads go
//! through the provider; writes return the submitted transaction hash and
//! leave confirmation to `chain::confirmation`.

pub mod assets;
pub mod payment;
pub mod primary;
pub mod secondary;

pub use assets::{AssetRegistry, EthereumAssetRegistry, DEFAULT_ADMIN_ROLE};
pub use payment::{EthereumPaymentToken, PaymentToken, PAYMENT_DECIMALS};
pub use primary::{EthereumPrimaryMarket, PrimaryMarket};
pub use secondary::{EthereumSecondaryMarket, ListingView, SecondaryMarket};

use ethers::contract::{AbiError, ContractError};
use ethers::providers::{Middleware, RpcError};
use ethers::types::{Address, H256};
use std::str::FromStr;

use crate::core::errors::{FundClientError, RemoteFailure};

pub(crate) fn parse_address(addr: &str) -> Result<Address, FundClientError> {
    Address::from_str(addr)
        .map_err(|e| FundClientError::Validation(format!("Invalid address '{}': {}", addr, e)))
}

pub(crate) fn abi_failure(err: AbiError) -> FundClientError {
    FundClientError::Ledger(format!("ABI encoding error: {}", err))
}

/// Map a contract-call failure into the user-facing taxonomy. Decoded
/// revert reasons and structured JSON-RPC codes are preferred over the
/// flattened message text.
pub(crate) fn call_failure<M: Middleware>(err: ContractError<M>) -> FundClientError {
    if let Some(reason) = err.decode_revert::<String>() {
        return FundClientError::classify(RemoteFailure::revert(reason));
    }
    if let ContractError::ProviderError { e } = &err {
        if let Some(rpc) = e.as_error_response() {
            return FundClientError::classify(RemoteFailure::new(Some(rpc.code), rpc.message.clone()));
        }
    }
    FundClientError::classify(RemoteFailure::new(None, err.to_string()))
}

pub(crate) fn tx_hash_string(hash: H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}
