//! Client for the off-chain asset metadata endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::core::errors::FundClientError;

/// Off-chain metadata document for one asset type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Anything else the document carries.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Fetches metadata documents keyed by a hex-padded entity identifier,
/// multi-token style: `<base>/<64-hex-digit id>.json`.
pub struct MetadataClient {
    base_url: String,
    client: Client,
}

impl MetadataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client: Client::new() }
    }

    /// URL of the document for `asset_id`: the identifier zero-padded to 64
    /// lowercase hex digits.
    pub fn document_url(&self, asset_id: u64) -> String {
        format!("{}/{:064x}.json", self.base_url, asset_id)
    }

    pub async fn fetch(&self, asset_id: u64) -> Result<AssetMetadata, FundClientError> {
        let url = self.document_url(asset_id);
        debug!(asset_id, url = %url, "Fetching asset metadata");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FundClientError::Network(format!(
                "Metadata fetch for asset {} returned {}",
                asset_id,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn document_url_pads_identifier_to_64_hex_digits() {
        let client = MetadataClient::new("https://meta.example/api/token/");
        assert_eq!(
            client.document_url(1),
            "https://meta.example/api/token/0000000000000000000000000000000000000000000000000000000000000001.json"
        );
        assert_eq!(
            client.document_url(0xabcd),
            "https://meta.example/api/token/000000000000000000000000000000000000000000000000000000000000abcd.json"
        );
    }

    #[tokio::test]
    async fn fetch_deserializes_document() {
        let server = MockServer::start_async().await;
        let path = format!("/{:064x}.json", 7u64);
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(path.clone());
                then.status(200).json_body(serde_json::json!({
                    "name": "Tokenized Gold",
                    "description": "One token per gram",
                    "image": "https://meta.example/img/gold.png",
                    "attributes": [{"trait_type": "class", "value": "commodity"}]
                }));
            })
            .await;

        let client = MetadataClient::new(server.base_url());
        let metadata = client.fetch(7).await.unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.name.as_deref(), Some("Tokenized Gold"));
        assert_eq!(metadata.image.as_deref(), Some("https://meta.example/img/gold.png"));
        assert!(metadata.extra.contains_key("attributes"));
    }

    #[tokio::test]
    async fn fetch_maps_http_error_to_network_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(404);
            })
            .await;

        let client = MetadataClient::new(server.base_url());
        let err = client.fetch(9).await.unwrap_err();
        assert!(matches!(err, FundClientError::Network(_)));
    }
}
