use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// One asset type known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub id: u64,
    pub name: String,
    pub symbol: String,
}

impl AssetInfo {
    /// Label used in asset pickers: `SYM - Name (ID: n)`.
    pub fn display_name(&self) -> String {
        format!("{} - {} (ID: {})", self.symbol, self.name, self.id)
    }
}

/// A strictly-positive position an owner holds in one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub asset_id: u64,
    pub name: String,
    pub symbol: String,
    /// Token count, always greater than zero.
    pub balance: U256,
}

/// An active secondary-market listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub listing_id: u64,
    pub asset_id: u64,
    pub seller: String,
    pub amount: U256,
    /// Unit price in payment-token base units.
    pub unit_price: U256,
}
