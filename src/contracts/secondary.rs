use async_trait::async_trait;
use ethers::abi::parse_abi;
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::info;

use super::{abi_failure, call_failure, parse_address, tx_hash_string};
use crate::core::errors::FundClientError;

/// Raw on-chain listing record. The market escrows the listed tokens until
/// the listing is filled or cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    pub seller: String,
    pub asset_id: u64,
    pub amount: U256,
    pub unit_price: U256,
    pub active: bool,
}

/// Capability set of the secondary market contract.
#[async_trait]
pub trait SecondaryMarket: Send + Sync {
    /// Deployed address of the market, 0x-prefixed. Sellers grant this
    /// address operator approval so it can escrow listed tokens.
    fn address(&self) -> String;

    /// Number of listings ever created (including inactive ones).
    async fn listing_count(&self) -> Result<u64, FundClientError>;

    /// Listing record by id. `Ok(None)` when the id was never assigned.
    async fn listing(&self, listing_id: u64) -> Result<Option<ListingView>, FundClientError>;

    /// Escrow `amount` tokens and open a listing at `unit_price`.
    async fn create_listing(
        &self,
        asset_id: u64,
        amount: U256,
        unit_price: U256,
    ) -> Result<String, FundClientError>;

    async fn buy_listing(&self, listing_id: u64) -> Result<String, FundClientError>;

    async fn cancel_listing(&self, listing_id: u64) -> Result<String, FundClientError>;
}

/// Ethers-backed secondary market façade.
pub struct EthereumSecondaryMarket<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> EthereumSecondaryMarket<M> {
    pub fn new(address: &str, client: Arc<M>) -> Result<Self, FundClientError> {
        let address = parse_address(address)?;
        let abi = parse_abi(&[
            "function getListingCount() view returns (uint256)",
            "function getListing(uint256 listingId) view returns (address, uint256, uint256, uint256, bool)",
            "function createListing(uint256 assetId, uint256 amount, uint256 price)",
            "function buyListing(uint256 listingId)",
            "function cancelListing(uint256 listingId)",
        ])
        .map_err(|e| FundClientError::Config(format!("Invalid secondary market ABI: {}", e)))?;

        Ok(Self { contract: Contract::new(address, abi, client) })
    }
}

#[async_trait]
impl<M: Middleware + 'static> SecondaryMarket for EthereumSecondaryMarket<M> {
    fn address(&self) -> String {
        format!("{:?}", self.contract.address())
    }

    async fn listing_count(&self) -> Result<u64, FundClientError> {
        let count: U256 = self
            .contract
            .method("getListingCount", ())
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)?;
        Ok(count.as_u64())
    }

    async fn listing(&self, listing_id: u64) -> Result<Option<ListingView>, FundClientError> {
        let (seller, asset_id, amount, unit_price, active): (Address, U256, U256, U256, bool) =
            self.contract
                .method("getListing", U256::from(listing_id))
                .map_err(abi_failure)?
                .call()
                .await
                .map_err(call_failure)?;

        // An unassigned id decodes as the zero record.
        if seller == Address::zero() {
            return Ok(None);
        }
        Ok(Some(ListingView {
            seller: format!("{:?}", seller),
            asset_id: asset_id.as_u64(),
            amount,
            unit_price,
            active,
        }))
    }

    async fn create_listing(
        &self,
        asset_id: u64,
        amount: U256,
        unit_price: U256,
    ) -> Result<String, FundClientError> {
        info!(asset_id, amount = %amount, unit_price = %unit_price, "Creating listing");
        let call = self
            .contract
            .method::<_, ()>("createListing", (U256::from(asset_id), amount, unit_price))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        let tx_hash = tx_hash_string(pending.tx_hash());
        info!(tx_hash = %tx_hash, "Listing submitted");
        Ok(tx_hash)
    }

    async fn buy_listing(&self, listing_id: u64) -> Result<String, FundClientError> {
        info!(listing_id, "Buying listing");
        let call = self
            .contract
            .method::<_, ()>("buyListing", U256::from(listing_id))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }

    async fn cancel_listing(&self, listing_id: u64) -> Result<String, FundClientError> {
        info!(listing_id, "Cancelling listing");
        let call = self
            .contract
            .method::<_, ()>("cancelListing", U256::from(listing_id))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }
}
