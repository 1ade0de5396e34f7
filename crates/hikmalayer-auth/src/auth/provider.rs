/*
[INPUT]:  Wallet provider capabilities (accounts, signing, account-change events)
[OUTPUT]: Provider abstraction and account-change subscriptions
[POS]:    Auth layer - wallet integration boundary
[UPDATE]: When adding provider capabilities or changing notification delivery
*/

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::http::Result;
use crate::types::{Address, Signature};

/// Trait for wallet provider operations
///
/// Implement this trait for each wallet backend. Account prompts and
/// signing are async because they wait on a user decision made outside
/// the application.
///
/// Implementations must never synthesize a signature or an address, and
/// must register listeners idempotently (see [`AccountsChangedHub`]).
#[async_trait]
pub trait SignerProvider: Send + Sync {
    /// Whether a signing provider is present at all
    fn is_available(&self) -> bool;

    /// Prompt for account access; a rejection is `AuthError::UserDeclined`
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts already authorized, without prompting
    async fn current_accounts(&self) -> Result<Vec<Address>>;

    /// Sign `message` with the key of `address`
    async fn sign(&self, message: &str, address: &Address) -> Result<Signature>;

    /// Register for account-change notifications
    ///
    /// Registering an already registered listener replaces the previous
    /// registration.
    fn subscribe_accounts_changed(&self, listener: ListenerId) -> AccountsSubscription;

    /// Remove a listener; unknown listeners are ignored
    fn unsubscribe_accounts_changed(&self, listener: ListenerId);
}

/// Identity of an account-change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of an account-change registration
///
/// An empty account list means the wallet was disconnected externally.
#[derive(Debug)]
pub struct AccountsSubscription {
    receiver: mpsc::UnboundedReceiver<Vec<Address>>,
}

impl AccountsSubscription {
    /// Next notification; `None` once the registration is removed or replaced
    pub async fn recv(&mut self) -> Option<Vec<Address>> {
        self.receiver.recv().await
    }
}

#[derive(Debug, Default)]
struct HubState {
    listeners: HashMap<ListenerId, mpsc::UnboundedSender<Vec<Address>>>,
    last_accounts: Option<Vec<Address>>,
}

/// Fan-out of account-change notifications shared by provider implementations
#[derive(Debug, Default)]
pub struct AccountsChangedHub {
    state: Mutex<HubState>,
}

impl AccountsChangedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hub whose baseline is `accounts`, so re-announcing them does not fire
    pub fn with_baseline(accounts: Vec<Address>) -> Self {
        let hub = Self::new();
        hub.lock().last_accounts = Some(accounts);
        hub
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, listener: ListenerId) -> AccountsSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        // Dropping the replaced sender closes the old receiver.
        self.lock().listeners.insert(listener, tx);
        AccountsSubscription { receiver: rx }
    }

    pub fn unsubscribe(&self, listener: ListenerId) -> bool {
        self.lock().listeners.remove(&listener).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Deliver `accounts` to every listener if they differ from the last
    /// announced list. Returns the number of listeners reached.
    pub fn notify(&self, accounts: Vec<Address>) -> usize {
        let mut state = self.lock();
        if state.last_accounts.as_ref() == Some(&accounts) {
            return 0;
        }
        state.last_accounts = Some(accounts.clone());
        state
            .listeners
            .retain(|_, tx| tx.send(accounts.clone()).is_ok());
        state.listeners.len()
    }
}
