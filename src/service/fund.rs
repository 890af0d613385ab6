use std::sync::{Arc, Mutex};
use std::time::Duration;

use ethers::types::U256;
use ethers::utils::parse_units;
use tracing::{info, warn};

use crate::chain::confirmation::wait_for_transaction;
use crate::chain::ledger::{Ledger, PendingCall, TxOutcome};
use crate::contracts::{
    AssetRegistry, PaymentToken, PrimaryMarket, SecondaryMarket, PAYMENT_DECIMALS,
};
use crate::core::errors::{ContractRule, FundClientError};
use crate::refresh::{self, AssetInfo, Holding, Listing, SnapshotWatcher};

/// The action boundary of the client. Every state-changing flow runs
/// submit → confirmation wait → snapshot refresh, and every failure is
/// classified before it reaches the caller; nothing escapes unhandled.
pub struct FundService {
    ledger: Arc<dyn Ledger>,
    registry: Arc<dyn AssetRegistry>,
    payment: Arc<dyn PaymentToken>,
    primary: Arc<dyn PrimaryMarket>,
    secondary: Arc<dyn SecondaryMarket>,
    confirmation_timeout: Duration,
    refresh_interval: Duration,
    assets: SnapshotWatcher<AssetInfo>,
    listings: SnapshotWatcher<Listing>,
    holdings: Mutex<Option<HoldingsWatch>>,
}

/// Holdings are owner-scoped; changing the owner replaces the watcher.
struct HoldingsWatch {
    owner: String,
    watcher: Arc<SnapshotWatcher<Holding>>,
}

impl FundService {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        registry: Arc<dyn AssetRegistry>,
        payment: Arc<dyn PaymentToken>,
        primary: Arc<dyn PrimaryMarket>,
        secondary: Arc<dyn SecondaryMarket>,
        confirmation_timeout: Duration,
        refresh_interval: Duration,
    ) -> Self {
        let assets = refresh::watch_assets(registry.clone(), refresh_interval);
        let listings = refresh::watch_listings(secondary.clone(), refresh_interval);
        Self {
            ledger,
            registry,
            payment,
            primary,
            secondary,
            confirmation_timeout,
            refresh_interval,
            assets,
            listings,
            holdings: Mutex::new(None),
        }
    }

    /// Watcher over the asset list.
    pub fn assets(&self) -> &SnapshotWatcher<AssetInfo> {
        &self.assets
    }

    /// Watcher over the active listings.
    pub fn listings(&self) -> &SnapshotWatcher<Listing> {
        &self.listings
    }

    /// Holdings watcher for `owner`. A different owner than last time tears
    /// the previous watcher down and spawns a fresh one.
    pub fn holdings_for(&self, owner: &str) -> Arc<SnapshotWatcher<Holding>> {
        let mut slot = self.holdings.lock().expect("holdings lock poisoned");
        if let Some(entry) = slot.as_ref() {
            if entry.owner == owner {
                return entry.watcher.clone();
            }
        }
        if let Some(previous) = slot.take() {
            previous.watcher.shutdown();
        }
        let watcher = Arc::new(refresh::watch_holdings(
            self.registry.clone(),
            owner.to_string(),
            self.refresh_interval,
        ));
        *slot = Some(HoldingsWatch { owner: owner.to_string(), watcher: watcher.clone() });
        watcher
    }

    /// Whether `account` may use the admin flows.
    pub async fn is_admin(&self, account: &str) -> Result<bool, FundClientError> {
        self.registry.has_admin_role(account).await
    }

    /// Create a new asset type (admin).
    pub async fn create_asset(
        &self,
        name: &str,
        symbol: &str,
    ) -> Result<TxOutcome, FundClientError> {
        let name = name.trim();
        let symbol = symbol.trim();
        if name.is_empty() {
            return Err(FundClientError::Validation("Asset name must not be empty".to_string()));
        }
        if symbol.is_empty() {
            return Err(FundClientError::Validation("Asset symbol must not be empty".to_string()));
        }

        let tx_hash = self.registry.create_asset(name, symbol).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_assets().await;
        Ok(outcome)
    }

    /// Mint shares of an existing asset to `to` (admin).
    pub async fn mint_asset_shares(
        &self,
        to: &str,
        asset_id: u64,
        amount: u64,
    ) -> Result<TxOutcome, FundClientError> {
        require_positive_amount(amount)?;
        let tx_hash = self.registry.mint(to, asset_id, U256::from(amount)).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_holdings().await;
        Ok(outcome)
    }

    /// Issue payment tokens to `to` (admin). `amount` is a decimal string
    /// in whole tokens.
    pub async fn mint_payment(&self, to: &str, amount: &str) -> Result<TxOutcome, FundClientError> {
        let amount = parse_payment_amount(amount)?;
        if amount.is_zero() {
            return Err(FundClientError::Validation("Amount must be greater than zero".to_string()));
        }
        let tx_hash = self.payment.mint(to, amount).await?;
        self.confirm(&tx_hash).await
    }

    /// Transfer asset shares between accounts.
    pub async fn transfer_shares(
        &self,
        from: &str,
        to: &str,
        asset_id: u64,
        amount: u64,
    ) -> Result<TxOutcome, FundClientError> {
        require_positive_amount(amount)?;
        let tx_hash = self.registry.transfer(from, to, asset_id, U256::from(amount)).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_holdings().await;
        Ok(outcome)
    }

    /// Set the primary-market unit price of an asset (fund manager).
    /// `price` is a decimal string in payment tokens.
    pub async fn configure_price(
        &self,
        asset_id: u64,
        price: &str,
    ) -> Result<TxOutcome, FundClientError> {
        let unit_price = parse_payment_amount(price)?;
        if unit_price.is_zero() {
            return Err(FundClientError::Validation("Price must be greater than zero".to_string()));
        }
        let tx_hash = self.primary.configure_asset(asset_id, unit_price).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_assets().await;
        Ok(outcome)
    }

    /// Buy `amount` tokens of an asset on the primary market, topping up
    /// the payment allowance first when it is short.
    ///
    /// When the allowance top-up itself times out pending, that pending
    /// outcome is returned and the purchase is not attempted; retry once
    /// the approval lands.
    pub async fn buy_primary(
        &self,
        buyer: &str,
        asset_id: u64,
        amount: u64,
    ) -> Result<TxOutcome, FundClientError> {
        require_positive_amount(amount)?;
        let unit_price = self.primary.asset_price(asset_id).await?;
        if unit_price.is_zero() {
            return Err(FundClientError::Validation(format!(
                "Asset {} is not configured for sale",
                asset_id
            )));
        }
        let total = unit_price.checked_mul(U256::from(amount)).ok_or_else(|| {
            FundClientError::Validation("Total price overflows".to_string())
        })?;

        if let Some(pending) =
            self.ensure_payment_allowance(buyer, &self.primary.address(), total).await?
        {
            return Ok(pending);
        }

        let tx_hash = self.primary.buy_asset(asset_id, U256::from(amount)).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_holdings().await;
        Ok(outcome)
    }

    /// List shares for sale on the secondary market, granting the market
    /// operator approval first when absent. The market escrows the shares.
    pub async fn create_listing(
        &self,
        seller: &str,
        asset_id: u64,
        amount: u64,
        unit_price: &str,
    ) -> Result<TxOutcome, FundClientError> {
        require_positive_amount(amount)?;
        let unit_price = parse_payment_amount(unit_price)?;
        if unit_price.is_zero() {
            return Err(FundClientError::Validation("Price must be greater than zero".to_string()));
        }

        let market = self.secondary.address();
        if !self.registry.is_approved_for_all(seller, &market).await? {
            info!(seller = %seller, "Granting the secondary market operator approval");
            let tx_hash = self.registry.set_approval_for_all(&market, true).await?;
            let outcome = self.confirm(&tx_hash).await?;
            if let TxOutcome::Pending { .. } = outcome {
                warn!("Operator approval not confirmed yet; retry listing once it lands");
                return Ok(outcome);
            }
        }

        let tx_hash =
            self.secondary.create_listing(asset_id, U256::from(amount), unit_price).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_listings().await;
        self.refresh_holdings().await;
        Ok(outcome)
    }

    /// Buy out an active listing, topping up the payment allowance first.
    pub async fn buy_listing(
        &self,
        buyer: &str,
        listing_id: u64,
    ) -> Result<TxOutcome, FundClientError> {
        let listing = self.secondary.listing(listing_id).await?.ok_or_else(|| {
            FundClientError::Validation(format!("Listing {} does not exist", listing_id))
        })?;
        if !listing.active {
            return Err(FundClientError::Rule(ContractRule::ListingNotActive));
        }
        let total = listing.unit_price.checked_mul(listing.amount).ok_or_else(|| {
            FundClientError::Validation("Total price overflows".to_string())
        })?;

        if let Some(pending) =
            self.ensure_payment_allowance(buyer, &self.secondary.address(), total).await?
        {
            return Ok(pending);
        }

        let tx_hash = self.secondary.buy_listing(listing_id).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_listings().await;
        self.refresh_holdings().await;
        Ok(outcome)
    }

    /// Cancel one of the caller's listings and reclaim the escrowed shares.
    pub async fn cancel_listing(&self, listing_id: u64) -> Result<TxOutcome, FundClientError> {
        let tx_hash = self.secondary.cancel_listing(listing_id).await?;
        let outcome = self.confirm(&tx_hash).await?;
        self.refresh_listings().await;
        self.refresh_holdings().await;
        Ok(outcome)
    }

    async fn confirm(&self, tx_hash: &str) -> Result<TxOutcome, FundClientError> {
        let call = PendingCall::new(tx_hash);
        wait_for_transaction(self.ledger.as_ref(), &call, self.confirmation_timeout).await
    }

    /// Top up `spender`'s allowance to `required` when the current one is
    /// short. Returns the pending outcome when the approval has not
    /// confirmed yet, `None` when the allowance is in place.
    async fn ensure_payment_allowance(
        &self,
        owner: &str,
        spender: &str,
        required: U256,
    ) -> Result<Option<TxOutcome>, FundClientError> {
        let current = self.payment.allowance(owner, spender).await?;
        if current >= required {
            return Ok(None);
        }

        info!(current = %current, required = %required, "Topping up payment allowance");
        let tx_hash = self.payment.approve(spender, required).await?;
        match self.confirm(&tx_hash).await? {
            TxOutcome::Confirmed(_) => Ok(None),
            pending @ TxOutcome::Pending { .. } => {
                warn!("Allowance approval not confirmed yet; retry the purchase once it lands");
                Ok(Some(pending))
            }
        }
    }

    async fn refresh_assets(&self) {
        if let Err(err) = self.assets.refresh_now().await {
            warn!(error = %err, "Post-transaction asset refresh failed");
        }
    }

    async fn refresh_listings(&self) {
        if let Err(err) = self.listings.refresh_now().await {
            warn!(error = %err, "Post-transaction listing refresh failed");
        }
    }

    async fn refresh_holdings(&self) {
        let watcher = {
            let slot = self.holdings.lock().expect("holdings lock poisoned");
            slot.as_ref().map(|entry| entry.watcher.clone())
        };
        if let Some(watcher) = watcher {
            if let Err(err) = watcher.refresh_now().await {
                warn!(error = %err, "Post-transaction holdings refresh failed");
            }
        }
    }
}

fn require_positive_amount(amount: u64) -> Result<(), FundClientError> {
    if amount == 0 {
        return Err(FundClientError::Validation("Amount must be greater than zero".to_string()));
    }
    Ok(())
}

/// Parse a decimal payment amount ("12.5") into base units.
fn parse_payment_amount(amount: &str) -> Result<U256, FundClientError> {
    let amount = amount.trim();
    if amount.is_empty() || amount.starts_with('-') {
        return Err(FundClientError::Validation(format!("Invalid amount '{}'", amount)));
    }
    let value = parse_units(amount, PAYMENT_DECIMALS)
        .map_err(|e| FundClientError::Validation(format!("Invalid amount '{}': {}", amount, e)))?;
    Ok(value.into())
}

/// Render an action result into the user-facing status line.
pub fn status_line(result: &Result<TxOutcome, FundClientError>) -> String {
    match result {
        Ok(TxOutcome::Confirmed(receipt)) => format!("Success! Tx: {}", short_hash(&receipt.hash)),
        Ok(TxOutcome::Pending { hash }) => {
            format!("Transaction taking longer than expected. Tx: {}", short_hash(hash))
        }
        Err(err) => format!("Error: {}", err),
    }
}

fn short_hash(hash: &str) -> String {
    if hash.len() > 10 {
        format!("{}...", &hash[..10])
    } else {
        hash.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ledger::TxReceipt;

    #[test]
    fn status_line_for_confirmed_outcome() {
        let result = Ok(TxOutcome::Confirmed(TxReceipt {
            hash: "0x1234567890abcdef".to_string(),
            block_number: Some(1),
            success: true,
        }));
        assert_eq!(status_line(&result), "Success! Tx: 0x12345678...");
    }

    #[test]
    fn status_line_for_pending_outcome() {
        let result = Ok(TxOutcome::Pending { hash: "0xabcdef0123456789".to_string() });
        assert_eq!(
            status_line(&result),
            "Transaction taking longer than expected. Tx: 0xabcdef01..."
        );
    }

    #[test]
    fn status_line_for_classified_error() {
        let result = Err(FundClientError::Rule(ContractRule::MissingRole));
        assert_eq!(status_line(&result), "Error: You do not have the required role");
    }

    #[test]
    fn payment_amounts_use_six_decimals() {
        assert_eq!(parse_payment_amount("1").unwrap(), U256::from(1_000_000u64));
        assert_eq!(parse_payment_amount("12.5").unwrap(), U256::from(12_500_000u64));
        assert!(parse_payment_amount("-3").is_err());
        assert!(parse_payment_amount("abc").is_err());
    }
}
