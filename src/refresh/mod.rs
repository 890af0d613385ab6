pub mod discovery;
pub mod snapshot;
pub mod watcher;

pub use discovery::{discover_assets, discover_holdings, discover_listings, MIN_PROBE_IDS};
pub use snapshot::{AssetInfo, Holding, Listing};
pub use watcher::SnapshotWatcher;

use std::sync::Arc;
use std::time::Duration;

use crate::contracts::{AssetRegistry, SecondaryMarket};

/// Watcher over the asset registry's asset list.
pub fn watch_assets<R>(registry: Arc<R>, interval: Duration) -> SnapshotWatcher<AssetInfo>
where
    R: AssetRegistry + ?Sized + 'static,
{
    SnapshotWatcher::spawn(interval, move || {
        let registry = registry.clone();
        async move { discover_assets(registry.as_ref()).await }
    })
}

/// Watcher over one owner's holdings. An owner change means shutting this
/// watcher down and spawning a fresh one.
pub fn watch_holdings<R>(
    registry: Arc<R>,
    owner: String,
    interval: Duration,
) -> SnapshotWatcher<Holding>
where
    R: AssetRegistry + ?Sized + 'static,
{
    SnapshotWatcher::spawn(interval, move || {
        let registry = registry.clone();
        let owner = owner.clone();
        async move { discover_holdings(registry.as_ref(), &owner).await }
    })
}

/// Watcher over the secondary market's active listings.
pub fn watch_listings<S>(market: Arc<S>, interval: Duration) -> SnapshotWatcher<Listing>
where
    S: SecondaryMarket + ?Sized + 'static,
{
    SnapshotWatcher::spawn(interval, move || {
        let market = market.clone();
        async move { discover_listings(market.as_ref()).await }
    })
}
