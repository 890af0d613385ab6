//! tests/refresher_discovery_tests.rs
//!
//! Discovery-pass behavior: probe ceiling, per-candidate skipping, entity
//! filters, ordering, and idempotence.

use async_trait::async_trait;
use ethers::types::U256;
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use defi_fund_client::contracts::{AssetRegistry, ListingView, SecondaryMarket};
use defi_fund_client::core::errors::FundClientError;
use defi_fund_client::refresh::{
    discover_assets, discover_holdings, discover_listings, MIN_PROBE_IDS,
};

const OWNER: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

fn ledger_err(what: &str) -> FundClientError {
    FundClientError::Ledger(what.to_string())
}

#[derive(Default)]
struct MockRegistry {
    /// `None` means the count accessor itself fails.
    count: Option<u64>,
    assets: BTreeMap<u64, (String, String)>,
    balances: HashMap<u64, U256>,
    failing_exists: HashSet<u64>,
    failing_attrs: HashSet<u64>,
    probed: Mutex<Vec<u64>>,
}

impl MockRegistry {
    fn with_assets(count: Option<u64>, ids: &[u64]) -> Self {
        let mut registry = Self { count, ..Default::default() };
        for &id in ids {
            registry.assets.insert(id, (format!("Asset {}", id), format!("AST{}", id)));
        }
        registry
    }

    fn probed(&self) -> Vec<u64> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetRegistry for MockRegistry {
    async fn asset_type_count(&self) -> Result<u64, FundClientError> {
        self.count.ok_or_else(|| ledger_err("count accessor unavailable"))
    }

    async fn asset_exists(&self, asset_id: u64) -> Result<bool, FundClientError> {
        self.probed.lock().unwrap().push(asset_id);
        if self.failing_exists.contains(&asset_id) {
            return Err(ledger_err("existence check failed"));
        }
        Ok(self.assets.contains_key(&asset_id))
    }

    async fn asset_name(&self, asset_id: u64) -> Result<String, FundClientError> {
        if self.failing_attrs.contains(&asset_id) {
            return Err(ledger_err("attribute read failed"));
        }
        self.assets
            .get(&asset_id)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| ledger_err("no such asset"))
    }

    async fn asset_symbol(&self, asset_id: u64) -> Result<String, FundClientError> {
        if self.failing_attrs.contains(&asset_id) {
            return Err(ledger_err("attribute read failed"));
        }
        self.assets
            .get(&asset_id)
            .map(|(_, symbol)| symbol.clone())
            .ok_or_else(|| ledger_err("no such asset"))
    }

    async fn balance_of(&self, _owner: &str, asset_id: u64) -> Result<U256, FundClientError> {
        Ok(self.balances.get(&asset_id).copied().unwrap_or_default())
    }

    async fn has_admin_role(&self, _account: &str) -> Result<bool, FundClientError> {
        Ok(false)
    }

    async fn is_approved_for_all(
        &self,
        _owner: &str,
        _operator: &str,
    ) -> Result<bool, FundClientError> {
        Ok(false)
    }

    async fn create_asset(&self, _name: &str, _symbol: &str) -> Result<String, FundClientError> {
        Err(ledger_err("not used in discovery tests"))
    }

    async fn mint(
        &self,
        _to: &str,
        _asset_id: u64,
        _amount: U256,
    ) -> Result<String, FundClientError> {
        Err(ledger_err("not used in discovery tests"))
    }

    async fn set_approval_for_all(
        &self,
        _operator: &str,
        _approved: bool,
    ) -> Result<String, FundClientError> {
        Err(ledger_err("not used in discovery tests"))
    }

    async fn transfer(
        &self,
        _from: &str,
        _to: &str,
        _asset_id: u64,
        _amount: U256,
    ) -> Result<String, FundClientError> {
        Err(ledger_err("not used in discovery tests"))
    }
}

#[derive(Default)]
struct MockMarket {
    count: Option<u64>,
    listings: BTreeMap<u64, ListingView>,
    failing: HashSet<u64>,
}

#[async_trait]
impl SecondaryMarket for MockMarket {
    fn address(&self) -> String {
        "0x0000000000000000000000000000000000000042".to_string()
    }

    async fn listing_count(&self) -> Result<u64, FundClientError> {
        self.count.ok_or_else(|| ledger_err("count accessor unavailable"))
    }

    async fn listing(&self, listing_id: u64) -> Result<Option<ListingView>, FundClientError> {
        if self.failing.contains(&listing_id) {
            return Err(ledger_err("listing read failed"));
        }
        Ok(self.listings.get(&listing_id).cloned())
    }

    async fn create_listing(
        &self,
        _asset_id: u64,
        _amount: U256,
        _unit_price: U256,
    ) -> Result<String, FundClientError> {
        Err(ledger_err("not used in discovery tests"))
    }

    async fn buy_listing(&self, _listing_id: u64) -> Result<String, FundClientError> {
        Err(ledger_err("not used in discovery tests"))
    }

    async fn cancel_listing(&self, _listing_id: u64) -> Result<String, FundClientError> {
        Err(ledger_err("not used in discovery tests"))
    }
}

fn listing(seller: &str, asset_id: u64, active: bool) -> ListingView {
    ListingView {
        seller: seller.to_string(),
        asset_id,
        amount: U256::from(5u64),
        unit_price: U256::from(1_000_000u64),
        active,
    }
}

#[tokio::test]
async fn unavailable_count_probes_exactly_the_floor() {
    let registry = MockRegistry::with_assets(None, &[1, 2]);
    let assets = discover_assets(&registry).await;

    assert_eq!(registry.probed(), (1..=MIN_PROBE_IDS).collect::<Vec<_>>());
    assert_eq!(assets.len(), 2);
}

#[tokio::test]
async fn zero_count_probes_exactly_the_floor() {
    let registry = MockRegistry::with_assets(Some(0), &[]);
    discover_assets(&registry).await;

    assert_eq!(registry.probed().len(), MIN_PROBE_IDS as usize);
}

#[tokio::test]
async fn small_count_is_raised_to_the_floor() {
    let registry = MockRegistry::with_assets(Some(3), &[1, 2, 3]);
    discover_assets(&registry).await;

    assert_eq!(registry.probed().len(), MIN_PROBE_IDS as usize);
}

#[tokio::test]
async fn large_count_extends_the_probe_range() {
    let registry = MockRegistry::with_assets(Some(25), &[1, 25]);
    let assets = discover_assets(&registry).await;

    assert_eq!(registry.probed().len(), 25);
    assert_eq!(assets.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 25]);
}

#[tokio::test]
async fn attribute_failure_skips_that_candidate_only() {
    // Count unavailable; 1, 2, 5 exist; 3, 4 don't; 5's attribute read
    // throws. The snapshot holds 1 and 2 only, in that order.
    let mut registry = MockRegistry::with_assets(None, &[1, 2, 5]);
    registry.failing_attrs.insert(5);

    let assets = discover_assets(&registry).await;
    assert_eq!(assets.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn existence_failure_does_not_abort_the_pass() {
    let mut registry = MockRegistry::with_assets(None, &[4]);
    registry.failing_exists.insert(3);

    let assets = discover_assets(&registry).await;
    assert_eq!(assets.iter().map(|a| a.id).collect::<Vec<_>>(), vec![4]);
}

#[tokio::test]
async fn repeated_passes_yield_identical_snapshots() {
    let registry = MockRegistry::with_assets(Some(4), &[1, 3]);

    let first = discover_assets(&registry).await;
    let second = discover_assets(&registry).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn holdings_keep_strictly_positive_balances_only() {
    let mut registry = MockRegistry::with_assets(Some(3), &[1, 2, 3]);
    registry.balances.insert(1, U256::from(5u64));
    registry.balances.insert(3, U256::from(7u64));
    // Asset 2 exists with zero balance.

    let holdings = discover_holdings(&registry, OWNER).await;
    assert_eq!(holdings.iter().map(|h| h.asset_id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(holdings[0].balance, U256::from(5u64));
    assert_eq!(holdings[0].name, "Asset 1");
    assert_eq!(holdings[0].symbol, "AST1");
}

#[tokio::test]
async fn listings_keep_active_entries_and_skip_failures() {
    let mut market = MockMarket { count: None, ..Default::default() };
    market.listings.insert(1, listing("0xaaa1", 1, true));
    market.listings.insert(2, listing("0xaaa2", 1, false));
    market.listings.insert(4, listing("0xaaa4", 2, true));
    market.failing.insert(3);

    let listings = discover_listings(&market).await;
    assert_eq!(listings.iter().map(|l| l.listing_id).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(listings[0].seller, "0xaaa1");
    assert_eq!(listings[1].asset_id, 2);
}

#[tokio::test]
async fn listing_count_extends_the_probe_range() {
    let mut market = MockMarket { count: Some(12), ..Default::default() };
    market.listings.insert(12, listing("0xaaab", 3, true));

    let listings = discover_listings(&market).await;
    assert_eq!(listings.iter().map(|l| l.listing_id).collect::<Vec<_>>(), vec![12]);
}
