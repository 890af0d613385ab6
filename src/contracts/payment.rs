use async_trait::async_trait;
use ethers::abi::parse_abi;
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::U256;
use std::sync::Arc;
use tracing::info;

use super::{abi_failure, call_failure, parse_address, tx_hash_string};
use crate::core::errors::FundClientError;

/// The settlement token uses six decimal places.
pub const PAYMENT_DECIMALS: u32 = 6;

/// Capability set of the fund's settlement currency token.
#[async_trait]
pub trait PaymentToken: Send + Sync {
    async fn balance_of(&self, owner: &str) -> Result<U256, FundClientError>;

    async fn allowance(&self, owner: &str, spender: &str) -> Result<U256, FundClientError>;

    /// Grant `spender` permission over `amount` base units.
    async fn approve(&self, spender: &str, amount: U256) -> Result<String, FundClientError>;

    /// Issue new tokens (admin only).
    async fn mint(&self, to: &str, amount: U256) -> Result<String, FundClientError>;
}

/// Ethers-backed payment token façade.
pub struct EthereumPaymentToken<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> EthereumPaymentToken<M> {
    pub fn new(address: &str, client: Arc<M>) -> Result<Self, FundClientError> {
        let address = parse_address(address)?;
        let abi = parse_abi(&[
            "function balanceOf(address account) view returns (uint256)",
            "function allowance(address owner, address spender) view returns (uint256)",
            "function approve(address spender, uint256 amount) returns (bool)",
            "function mint(address to, uint256 amount)",
        ])
        .map_err(|e| FundClientError::Config(format!("Invalid payment token ABI: {}", e)))?;

        Ok(Self { contract: Contract::new(address, abi, client) })
    }
}

#[async_trait]
impl<M: Middleware + 'static> PaymentToken for EthereumPaymentToken<M> {
    async fn balance_of(&self, owner: &str) -> Result<U256, FundClientError> {
        let owner = parse_address(owner)?;
        self.contract
            .method("balanceOf", owner)
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn allowance(&self, owner: &str, spender: &str) -> Result<U256, FundClientError> {
        let owner = parse_address(owner)?;
        let spender = parse_address(spender)?;
        self.contract
            .method("allowance", (owner, spender))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn approve(&self, spender: &str, amount: U256) -> Result<String, FundClientError> {
        let spender = parse_address(spender)?;
        info!(spender = ?spender, amount = %amount, "Approving payment allowance");
        let call = self
            .contract
            .method::<_, bool>("approve", (spender, amount))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }

    async fn mint(&self, to: &str, amount: U256) -> Result<String, FundClientError> {
        let to = parse_address(to)?;
        info!(amount = %amount, "Minting payment tokens");
        let call = self
            .contract
            .method::<_, ()>("mint", (to, amount))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }
}
