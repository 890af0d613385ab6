use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::chain::ledger::{Ledger, PendingCall, TxOutcome};
use crate::core::errors::FundClientError;

/// Default window before the fallback receipt check takes over.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Resolve a submitted transaction to a definite outcome without hanging the
/// caller past `timeout` plus one extra receipt lookup.
///
/// Races the ledger's native one-confirmation wait against the timer:
/// - native wait wins: its receipt is returned;
/// - native wait fails (revert, dropped transaction, transport): that error
///   propagates unchanged;
/// - timer wins: one manual receipt lookup decides. A receipt with a block
///   number is a late success, not an error. No receipt means the
///   transaction is still pending and a pending-tagged outcome is returned
///   instead of blocking further. If the lookup itself fails, the timeout is
///   reported, not the lookup error.
///
/// The abandoned native wait is simply dropped; nothing is cancelled
/// remotely and no retries happen beyond the single fallback check.
pub async fn wait_for_transaction<L>(
    ledger: &L,
    call: &PendingCall,
    timeout: Duration,
) -> Result<TxOutcome, FundClientError>
where
    L: Ledger + ?Sized,
{
    let hash = call.hash.as_str();
    match tokio::time::timeout(timeout, ledger.wait_for_confirmation(hash)).await {
        Ok(Ok(receipt)) => {
            debug!(tx_hash = %hash, block = ?receipt.block_number, "Transaction confirmed");
            Ok(TxOutcome::Confirmed(receipt))
        }
        Ok(Err(err)) => Err(err),
        Err(_) => {
            let age_ms = (Utc::now() - call.submitted_at).num_milliseconds();
            warn!(
                tx_hash = %hash,
                timeout_ms = timeout.as_millis() as u64,
                age_ms,
                "Confirmation wait timed out, checking receipt manually"
            );
            match ledger.receipt_by_hash(hash).await {
                Ok(Some(receipt)) if receipt.block_number.is_some() => {
                    debug!(tx_hash = %hash, block = ?receipt.block_number, "Manual receipt check found a mined transaction");
                    Ok(TxOutcome::Confirmed(receipt))
                }
                Ok(_) => {
                    warn!(tx_hash = %hash, "Transaction still pending or not found");
                    Ok(TxOutcome::Pending { hash: hash.to_string() })
                }
                Err(err) => {
                    warn!(tx_hash = %hash, error = %err, "Manual receipt check failed");
                    Err(FundClientError::ConfirmationTimeout {
                        hash: hash.to_string(),
                        waited_ms: timeout.as_millis() as u64,
                    })
                }
            }
        }
    }
}
