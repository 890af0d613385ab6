use async_trait::async_trait;
use ethers::abi::parse_abi;
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Bytes, U256};
use std::sync::Arc;
use tracing::{debug, info};

use super::{abi_failure, call_failure, parse_address, tx_hash_string};
use crate::core::errors::FundClientError;

/// Role identifier the registry's access control treats as admin
/// (32 zero bytes).
pub const DEFAULT_ADMIN_ROLE: [u8; 32] = [0u8; 32];

/// Capability set of the multi-token asset registry contract.
#[async_trait]
pub trait AssetRegistry: Send + Sync {
    /// Number of asset types created so far. May undercount on some
    /// deployments; discovery treats it as a hint, not the truth.
    async fn asset_type_count(&self) -> Result<u64, FundClientError>;

    async fn asset_exists(&self, asset_id: u64) -> Result<bool, FundClientError>;

    async fn asset_name(&self, asset_id: u64) -> Result<String, FundClientError>;

    async fn asset_symbol(&self, asset_id: u64) -> Result<String, FundClientError>;

    async fn balance_of(&self, owner: &str, asset_id: u64) -> Result<U256, FundClientError>;

    /// Whether the account holds the registry's admin role.
    async fn has_admin_role(&self, account: &str) -> Result<bool, FundClientError>;

    async fn is_approved_for_all(
        &self,
        owner: &str,
        operator: &str,
    ) -> Result<bool, FundClientError>;

    async fn create_asset(&self, name: &str, symbol: &str) -> Result<String, FundClientError>;

    async fn mint(&self, to: &str, asset_id: u64, amount: U256)
        -> Result<String, FundClientError>;

    async fn set_approval_for_all(
        &self,
        operator: &str,
        approved: bool,
    ) -> Result<String, FundClientError>;

    async fn transfer(
        &self,
        from: &str,
        to: &str,
        asset_id: u64,
        amount: U256,
    ) -> Result<String, FundClientError>;
}

/// Ethers-backed asset registry façade.
pub struct EthereumAssetRegistry<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> EthereumAssetRegistry<M> {
    pub fn new(address: &str, client: Arc<M>) -> Result<Self, FundClientError> {
        let address = parse_address(address)?;
        let abi = parse_abi(&[
            "function getAssetTypeCount() view returns (uint256)",
            "function assetExists(uint256 assetId) view returns (bool)",
            "function getAssetName(uint256 assetId) view returns (string)",
            "function getAssetSymbol(uint256 assetId) view returns (string)",
            "function balanceOf(address account, uint256 id) view returns (uint256)",
            "function hasRole(bytes32 role, address account) view returns (bool)",
            "function isApprovedForAll(address account, address operator) view returns (bool)",
            "function setApprovalForAll(address operator, bool approved)",
            "function createAsset(string name, string symbol)",
            "function mint(address to, uint256 id, uint256 amount)",
            "function safeTransferFrom(address from, address to, uint256 id, uint256 amount, bytes data)",
        ])
        .map_err(|e| FundClientError::Config(format!("Invalid asset registry ABI: {}", e)))?;

        Ok(Self { contract: Contract::new(address, abi, client) })
    }
}

#[async_trait]
impl<M: Middleware + 'static> AssetRegistry for EthereumAssetRegistry<M> {
    async fn asset_type_count(&self) -> Result<u64, FundClientError> {
        let count: U256 = self
            .contract
            .method("getAssetTypeCount", ())
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)?;
        Ok(count.as_u64())
    }

    async fn asset_exists(&self, asset_id: u64) -> Result<bool, FundClientError> {
        self.contract
            .method("assetExists", U256::from(asset_id))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn asset_name(&self, asset_id: u64) -> Result<String, FundClientError> {
        self.contract
            .method("getAssetName", U256::from(asset_id))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn asset_symbol(&self, asset_id: u64) -> Result<String, FundClientError> {
        self.contract
            .method("getAssetSymbol", U256::from(asset_id))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn balance_of(&self, owner: &str, asset_id: u64) -> Result<U256, FundClientError> {
        let owner = parse_address(owner)?;
        self.contract
            .method("balanceOf", (owner, U256::from(asset_id)))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn has_admin_role(&self, account: &str) -> Result<bool, FundClientError> {
        let account = parse_address(account)?;
        let has_role: bool = self
            .contract
            .method("hasRole", (DEFAULT_ADMIN_ROLE, account))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)?;
        debug!(account = ?account, has_role, "Admin role check");
        Ok(has_role)
    }

    async fn is_approved_for_all(
        &self,
        owner: &str,
        operator: &str,
    ) -> Result<bool, FundClientError> {
        let owner = parse_address(owner)?;
        let operator = parse_address(operator)?;
        self.contract
            .method("isApprovedForAll", (owner, operator))
            .map_err(abi_failure)?
            .call()
            .await
            .map_err(call_failure)
    }

    async fn create_asset(&self, name: &str, symbol: &str) -> Result<String, FundClientError> {
        info!(name, symbol, "Creating asset type");
        let call = self
            .contract
            .method::<_, ()>("createAsset", (name.to_string(), symbol.to_string()))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        let tx_hash = tx_hash_string(pending.tx_hash());
        info!(tx_hash = %tx_hash, "Asset creation submitted");
        Ok(tx_hash)
    }

    async fn mint(
        &self,
        to: &str,
        asset_id: u64,
        amount: U256,
    ) -> Result<String, FundClientError> {
        let to = parse_address(to)?;
        info!(asset_id, amount = %amount, "Minting asset shares");
        let call = self
            .contract
            .method::<_, ()>("mint", (to, U256::from(asset_id), amount))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }

    async fn set_approval_for_all(
        &self,
        operator: &str,
        approved: bool,
    ) -> Result<String, FundClientError> {
        let operator = parse_address(operator)?;
        info!(operator = ?operator, approved, "Setting operator approval");
        let call = self
            .contract
            .method::<_, ()>("setApprovalForAll", (operator, approved))
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }

    async fn transfer(
        &self,
        from: &str,
        to: &str,
        asset_id: u64,
        amount: U256,
    ) -> Result<String, FundClientError> {
        let from = parse_address(from)?;
        let to = parse_address(to)?;
        info!(asset_id, amount = %amount, "Transferring asset shares");
        let call = self
            .contract
            .method::<_, ()>(
                "safeTransferFrom",
                (from, to, U256::from(asset_id), amount, Bytes::default()),
            )
            .map_err(abi_failure)?;
        let pending = call
            .send()
            .await
            .map_err(call_failure)?;
        Ok(tx_hash_string(pending.tx_hash()))
    }
}
