use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::core::errors::FundClientError;

/// Notifications emitted by a wallet connection provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
    Disconnected,
}

/// Capability exposed by a wallet connection provider.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Prompt the provider for a connection; resolves with the selected
    /// accounts, first entry active.
    async fn request_connection(&self) -> Result<Vec<String>, FundClientError>;

    async fn disconnect(&self) -> Result<(), FundClientError>;

    async fn list_accounts(&self) -> Result<Vec<String>, FundClientError>;

    async fn current_chain(&self) -> Result<u64, FundClientError>;

    /// Subscribe to account/chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Explicit wallet connection context. Constructed where it is used and
/// dropped with its owner; never process-wide state.
pub struct WalletSession<C: WalletConnector> {
    connector: C,
    account: Option<String>,
    chain_id: Option<u64>,
}

impl<C: WalletConnector> WalletSession<C> {
    pub fn new(connector: C) -> Self {
        Self { connector, account: None, chain_id: None }
    }

    pub async fn connect(&mut self) -> Result<&str, FundClientError> {
        let accounts = self.connector.request_connection().await?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| FundClientError::Session("Provider returned no accounts".to_string()))?;
        let chain_id = self.connector.current_chain().await?;

        info!(account = %account, chain_id, "Wallet connected");
        self.account = Some(account);
        self.chain_id = Some(chain_id);
        Ok(self.account.as_deref().expect("account set above"))
    }

    pub async fn disconnect(&mut self) -> Result<(), FundClientError> {
        self.connector.disconnect().await?;
        self.account = None;
        self.chain_id = None;
        info!("Wallet disconnected");
        Ok(())
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Receiver for the connector's change notifications. The owner drives
    /// `apply_event` with whatever arrives here.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.connector.subscribe()
    }

    /// Fold a provider notification into the session state. An empty
    /// account list means the provider dropped us.
    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    info!(account = %account, "Active account changed");
                    self.account = Some(account);
                }
                None => {
                    warn!("Provider reported no accounts, treating as disconnect");
                    self.account = None;
                    self.chain_id = None;
                }
            },
            SessionEvent::ChainChanged(chain_id) => {
                info!(chain_id, "Chain changed");
                self.chain_id = Some(chain_id);
            }
            SessionEvent::Disconnected => {
                self.account = None;
                self.chain_id = None;
            }
        }
    }
}

/// Connector over a fixed account set, for embedders that manage their own
/// signer and for tests. `notify` simulates provider-side events.
pub struct StaticConnector {
    accounts: Vec<String>,
    chain_id: u64,
    events: broadcast::Sender<SessionEvent>,
}

impl StaticConnector {
    pub fn new(accounts: Vec<String>, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { accounts, chain_id, events }
    }

    pub fn notify(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletConnector for StaticConnector {
    async fn request_connection(&self) -> Result<Vec<String>, FundClientError> {
        Ok(self.accounts.clone())
    }

    async fn disconnect(&self) -> Result<(), FundClientError> {
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<String>, FundClientError> {
        Ok(self.accounts.clone())
    }

    async fn current_chain(&self) -> Result<u64, FundClientError> {
        Ok(self.chain_id)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
    const BOB: &str = "0x8ba1f109551bd432803012645ac136ddd64dba72";

    #[tokio::test]
    async fn connect_adopts_first_account_and_chain() {
        let connector = StaticConnector::new(vec![ALICE.to_string(), BOB.to_string()], 11155111);
        let mut session = WalletSession::new(connector);
        assert!(!session.is_connected());

        let account = session.connect().await.unwrap().to_string();
        assert_eq!(account, ALICE);
        assert_eq!(session.chain_id(), Some(11155111));
        assert!(session.is_connected());

        session.disconnect().await.unwrap();
        assert!(!session.is_connected());
        assert_eq!(session.chain_id(), None);
    }

    #[tokio::test]
    async fn connect_fails_with_no_accounts() {
        let connector = StaticConnector::new(vec![], 1);
        let mut session = WalletSession::new(connector);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, FundClientError::Session(_)));
    }

    #[tokio::test]
    async fn empty_account_change_disconnects() {
        let connector = StaticConnector::new(vec![ALICE.to_string()], 1);
        let mut session = WalletSession::new(connector);
        session.connect().await.unwrap();

        session.apply_event(SessionEvent::AccountsChanged(vec![BOB.to_string()]));
        assert_eq!(session.account(), Some(BOB));

        session.apply_event(SessionEvent::AccountsChanged(vec![]));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn chain_change_updates_session() {
        let connector = StaticConnector::new(vec![ALICE.to_string()], 1);
        let mut session = WalletSession::new(connector);
        session.connect().await.unwrap();

        session.apply_event(SessionEvent::ChainChanged(137));
        assert_eq!(session.chain_id(), Some(137));
    }

    #[tokio::test]
    async fn connector_events_reach_subscribers() {
        let connector = StaticConnector::new(vec![ALICE.to_string()], 1);
        let session = WalletSession::new(connector);
        let mut events = session.events();

        session.connector.notify(SessionEvent::ChainChanged(137));
        assert_eq!(events.recv().await.unwrap(), SessionEvent::ChainChanged(137));
    }
}
