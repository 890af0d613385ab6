pub mod confirmation;
pub mod ethereum;
pub mod ledger;
pub mod session;

pub use confirmation::{wait_for_transaction, DEFAULT_CONFIRMATION_TIMEOUT};
pub use ethereum::EthereumLedger;
pub use ledger::{Ledger, PendingCall, TxOutcome, TxReceipt};
pub use session::{SessionEvent, WalletConnector, WalletSession};
