use async_trait::async_trait;
use ethers::abi::parse_abi;
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::U256;
use std::sync::Arc;
use tracing::info;

use super::{abi_failure, call_failure, parse_address, tx_hash_string};
use crate::core::errors::FundClientError;

/// Capability set of the primary market contract. Purchases settle
/// atomically against the payment-token allowance the buyer granted.
#[async_trait]
pub trait PrimaryMarket: Send + Sync {
    /// Deployed address of the market, 0x-prefixed. Buyers grant their
    /// payment-token allowance to this address.
    fn address(&self) -> String;

    /// Configured unit price in payment-token base units. Zero means the
    /// asset has not been configured for sale.
    async fn asset_price(&self, asset_id: u64) -> Result<U256, FundClientError>;

    /// Tokens the market still has available for primary sale.
    async fn asset_available(&self, asset_id: u64) -> Result<U256, FundClientError>;

    /// Set the unit price for an asset (fund-manager role).
    async fn configure_asset(
        &self,
        asset_id: u64,
        unit_price: U256,
    ) -> Result<String, FundClientError>;

    /// Buy `amount` tokens at the configured price.
    async fn buy_asset(&self, asset_id: u64, amount: U256) -> Result<String, FundClientError>;
}

/// Ethers-backed primary market façade.
pub struct EthereumPrimaryMarket<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> EthereumPrimaryMarket<M> {
    pub fn new(address: &str, client: Arc<M>) -> Result<Self, FundClientError> {
        let address = parse_address(address)?;
        let abi = parse_abi(&[
            "function getAssetPrice(uint256 assetId) view returns (uint256)",
            "function getAssetAvailability(uint256 assetId) view returns (uint256)",
            "function configureAsset(uint256 assetId, uint256 price)",
            "function buyAsset(uint256 assetId, uint256 amount)",
        ])
        .map_err(|e| FundClientError::Config(format!("Invalid primary market ABI: {}", e)))?;

        Ok(Self { contract: Contract::new(address, abi, client) })
    }
}

#[async_trait]
impl<M: Middleware + 'static> PrimaryMarket for EthereumPrimaryMarket<M> {
    fn address(&self) -> String {
        format!("{:?}", self.contract.address())
    }

    async fn asset_price(&self, asset_id: u64) -> Result<U256, FundClientError> {
        self.contract
            .method("getAssetPrice", U256::from(asset_id))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn asset_available(&self, asset_id: u64) -> Result<U256, FundClientError> {
        self.contract
            .method("getAssetAvailability", U256::from(asset_id))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn configure_asset(
        &self,
        asset_id: u64,
        unit_price: U256,
    ) -> Result<String, FundClientError> {
        info!(asset_id, unit_price = %unit_price, "Configuring primary market price");
        let call = self
            .contract
            .method::<_, ()>("configureAsset", (U256::from(asset_id), unit_price))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        let tx_hash = tx_hash_string(pending.tx_hash());
        info!(tx_hash = %tx_hash, "Price configuration submitted");
        Ok(tx_hash)
    }

    async fn buy_asset(&self, asset_id: u64, amount: U256) -> Result<String, FundClientError> {
        info!(asset_id, amount = %amount, "Buying on primary market");
        let call = self
            .contract
            .method::<_, ()>("buyAsset", (U256::from(asset_id), amount))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }
}
