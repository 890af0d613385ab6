use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Middleware, PendingTransaction, Provider};
use ethers::types::{TransactionReceipt, H256, U64};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::ledger::{Ledger, TxReceipt};
use crate::core::errors::FundClientError;

/// Ledger accessor backed by an Ethereum JSON-RPC provider.
#[derive(Clone, Debug)]
pub struct EthereumLedger<P: JsonRpcClient + Clone = Http> {
    provider: Provider<P>,
    network_name: String,
    chain_id: u64,
}

impl EthereumLedger<Http> {
    pub async fn new(rpc_url: &str) -> Result<Self, FundClientError> {
        let rpc_url_clean = rpc_url.trim();
        let parsed_url = reqwest::Url::parse(rpc_url_clean).map_err(|e| {
            FundClientError::Config(format!("Invalid RPC URL '{}': {}", rpc_url_clean, e))
        })?;

        info!("Connecting to Ethereum network: {}", parsed_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FundClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let provider = Provider::new(Http::new_with_client(parsed_url.clone(), client));

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| {
                FundClientError::Ledger(format!(
                    "Failed to get chain ID from {}: {}. This might be a network issue or an invalid RPC URL.",
                    parsed_url, e
                ))
            })?
            .as_u64();

        let network_name = network_name_for(chain_id);
        info!("Connected to {} (Chain ID: {})", network_name, chain_id);

        Ok(Self { provider, network_name, chain_id })
    }
}

impl<P: JsonRpcClient + Clone> EthereumLedger<P>
where
    P: Send + Sync,
{
    /// Creates a ledger accessor over an existing provider.
    /// This is useful for testing with a `MockProvider`.
    pub fn new_with_provider(provider: Provider<P>) -> Self {
        Self { provider, network_name: "test".to_string(), chain_id: 1 }
    }

    pub fn provider(&self) -> &Provider<P> {
        &self.provider
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }
}

fn network_name_for(chain_id: u64) -> String {
    match chain_id {
        1 => "ethereum".to_string(),
        11155111 => "sepolia".to_string(),
        137 => "polygon".to_string(),
        31337 => "localhost".to_string(),
        _ => format!("ethereum-{}", chain_id),
    }
}

fn parse_hash(hash: &str) -> Result<H256, FundClientError> {
    H256::from_str(hash).map_err(|e| {
        FundClientError::Validation(format!("Invalid transaction hash '{}': {}", hash, e))
    })
}

fn receipt_from(receipt: TransactionReceipt) -> TxReceipt {
    TxReceipt {
        hash: format!("0x{}", hex::encode(receipt.transaction_hash.as_bytes())),
        block_number: receipt.block_number.map(|b| b.as_u64()),
        success: receipt.status.map(|s| s == U64::from(1)).unwrap_or(true),
    }
}

#[async_trait]
impl<P> Ledger for EthereumLedger<P>
where
    P: JsonRpcClient + Clone + 'static + Send + Sync,
{
    async fn wait_for_confirmation(&self, hash: &str) -> Result<TxReceipt, FundClientError> {
        let tx_hash = parse_hash(hash)?;
        debug!(tx_hash = %hash, "Waiting for one confirmation");

        let pending = PendingTransaction::new(tx_hash, &self.provider).confirmations(1);
        match pending.await {
            Ok(Some(receipt)) => {
                if receipt.status == Some(U64::zero()) {
                    return Err(FundClientError::Reverted { hash: hash.to_string() });
                }
                Ok(receipt_from(receipt))
            }
            Ok(None) => Err(FundClientError::Ledger(format!(
                "Transaction {} was dropped from the mempool",
                hash
            ))),
            Err(e) => {
                Err(FundClientError::Ledger(format!("Failed waiting for confirmation: {}", e)))
            }
        }
    }

    async fn receipt_by_hash(&self, hash: &str) -> Result<Option<TxReceipt>, FundClientError> {
        let tx_hash = parse_hash(hash)?;
        debug!(tx_hash = %hash, "Fetching transaction receipt");

        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| FundClientError::Ledger(format!("Failed to get receipt: {}", e)))?;

        Ok(receipt.map(receipt_from))
    }

    async fn block_number(&self) -> Result<u64, FundClientError> {
        let block_number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| FundClientError::Ledger(format!("Failed to get block number: {}", e)))?;
        Ok(block_number.as_u64())
    }

    async fn chain_id(&self) -> Result<u64, FundClientError> {
        // Resolved once at construction.
        Ok(self.chain_id)
    }
}
