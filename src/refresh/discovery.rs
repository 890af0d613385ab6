use tracing::{debug, warn};

use super::snapshot::{AssetInfo, Holding, Listing};
use crate::contracts::{AssetRegistry, SecondaryMarket};
use crate::core::errors::FundClientError;

/// Floor on the number of identifiers probed per discovery pass. Guards
/// against an undercounting or missing count accessor while bounding
/// worst-case read volume.
///
/// Known limitation: when true cardinality exceeds both this floor and a
/// stale reported count, the tail stays undiscovered until the count
/// catches up.
pub const MIN_PROBE_IDS: u64 = 10;

/// Effective upper bound of a discovery pass.
pub(crate) fn probe_ceiling(reported_count: Option<u64>) -> u64 {
    reported_count.unwrap_or(0).max(MIN_PROBE_IDS)
}

async fn reported_asset_count<R>(registry: &R) -> Option<u64>
where
    R: AssetRegistry + ?Sized,
{
    match registry.asset_type_count().await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(error = %err, "Could not get asset type count, probing default range");
            None
        }
    }
}

/// Rebuild the asset list. Identifiers are probed ascending from 1 through
/// the effective ceiling; absent ids are skipped silently, and a read error
/// on one candidate skips that candidate only.
pub async fn discover_assets<R>(registry: &R) -> Vec<AssetInfo>
where
    R: AssetRegistry + ?Sized,
{
    let ceiling = probe_ceiling(reported_asset_count(registry).await);
    let mut assets = Vec::new();
    for asset_id in 1..=ceiling {
        match read_asset(registry, asset_id).await {
            Ok(Some(asset)) => assets.push(asset),
            Ok(None) => {}
            Err(err) => warn!(asset_id, error = %err, "Skipping asset after read failure"),
        }
    }
    debug!(count = assets.len(), ceiling, "Asset discovery pass complete");
    assets
}

async fn read_asset<R>(registry: &R, asset_id: u64) -> Result<Option<AssetInfo>, FundClientError>
where
    R: AssetRegistry + ?Sized,
{
    if !registry.asset_exists(asset_id).await? {
        return Ok(None);
    }
    let name = registry.asset_name(asset_id).await?;
    let symbol = registry.asset_symbol(asset_id).await?;
    Ok(Some(AssetInfo { id: asset_id, name, symbol }))
}

/// Rebuild the holdings list for `owner`. Only strictly-positive balances
/// are kept.
pub async fn discover_holdings<R>(registry: &R, owner: &str) -> Vec<Holding>
where
    R: AssetRegistry + ?Sized,
{
    let ceiling = probe_ceiling(reported_asset_count(registry).await);
    let mut holdings = Vec::new();
    for asset_id in 1..=ceiling {
        match read_holding(registry, owner, asset_id).await {
            Ok(Some(holding)) => holdings.push(holding),
            Ok(None) => {}
            Err(err) => warn!(asset_id, error = %err, "Skipping holding after read failure"),
        }
    }
    debug!(owner = %owner, count = holdings.len(), "Holdings discovery pass complete");
    holdings
}

async fn read_holding<R>(
    registry: &R,
    owner: &str,
    asset_id: u64,
) -> Result<Option<Holding>, FundClientError>
where
    R: AssetRegistry + ?Sized,
{
    if !registry.asset_exists(asset_id).await? {
        return Ok(None);
    }
    let balance = registry.balance_of(owner, asset_id).await?;
    if balance.is_zero() {
        return Ok(None);
    }
    let name = registry.asset_name(asset_id).await?;
    let symbol = registry.asset_symbol(asset_id).await?;
    Ok(Some(Holding { asset_id, name, symbol, balance }))
}

/// Rebuild the list of active listings. Inactive and unassigned ids are
/// skipped silently.
pub async fn discover_listings<S>(market: &S) -> Vec<Listing>
where
    S: SecondaryMarket + ?Sized,
{
    let reported = match market.listing_count().await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(error = %err, "Could not get listing count, probing default range");
            None
        }
    };
    let ceiling = probe_ceiling(reported);
    let mut listings = Vec::new();
    for listing_id in 1..=ceiling {
        match market.listing(listing_id).await {
            Ok(Some(view)) if view.active => listings.push(Listing {
                listing_id,
                asset_id: view.asset_id,
                seller: view.seller,
                amount: view.amount,
                unit_price: view.unit_price,
            }),
            Ok(_) => {}
            Err(err) => warn!(listing_id, error = %err, "Skipping listing after read failure"),
        }
    }
    debug!(count = listings.len(), ceiling, "Listing discovery pass complete");
    listings
}
