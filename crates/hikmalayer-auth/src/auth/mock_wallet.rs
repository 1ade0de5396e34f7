/*
[INPUT]:  Scripted accounts, signatures and user decisions
[OUTPUT]: Deterministic wallet provider behaviour for tests
[POS]:    Auth layer - test double for the wallet integration boundary
[UPDATE]: When SignerProvider gains capabilities
*/

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::auth::provider::{AccountsChangedHub, AccountsSubscription, ListenerId, SignerProvider};
use crate::http::{AuthError, Result};
use crate::types::{Address, Signature};

#[derive(Debug, Default)]
struct MockState {
    available: bool,
    accounts: Vec<Address>,
    decline_accounts: bool,
    decline_signing: bool,
    signatures: HashMap<Address, Signature>,
    signed_messages: Vec<(Address, String)>,
    request_accounts_calls: usize,
}

/// Mock wallet provider for testing
///
/// Signs only with signatures scripted through [`MockSignerProvider::with_signature`].
#[derive(Debug)]
pub struct MockSignerProvider {
    state: Mutex<MockState>,
    hub: AccountsChangedHub,
}

impl MockSignerProvider {
    /// Available provider exposing `accounts`, all already authorized
    pub fn new(accounts: &[&str]) -> Self {
        let accounts: Vec<Address> = accounts.iter().map(|a| Address::new(a)).collect();
        Self {
            hub: AccountsChangedHub::with_baseline(accounts.clone()),
            state: Mutex::new(MockState {
                available: true,
                accounts,
                ..MockState::default()
            }),
        }
    }

    /// Provider that is not installed
    pub fn unavailable() -> Self {
        let provider = Self::new(&[]);
        provider.lock().available = false;
        provider
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Script the signature returned for `address`
    pub fn with_signature(self, address: &str, signature: &str) -> Self {
        self.lock()
            .signatures
            .insert(Address::new(address), Signature::new(signature));
        self
    }

    pub fn set_decline_accounts(&self, decline: bool) {
        self.lock().decline_accounts = decline;
    }

    pub fn set_decline_signing(&self, decline: bool) {
        self.lock().decline_signing = decline;
    }

    /// Change the authorized accounts without announcing it
    pub fn set_accounts(&self, accounts: &[&str]) {
        self.lock().accounts = accounts.iter().map(|a| Address::new(a)).collect();
    }

    /// Switch accounts as the user would in the wallet UI and announce it.
    /// Returns the number of listeners notified.
    pub fn emit_accounts_changed(&self, accounts: &[&str]) -> usize {
        self.set_accounts(accounts);
        let accounts = self.lock().accounts.clone();
        self.hub.notify(accounts)
    }

    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }

    pub fn request_accounts_calls(&self) -> usize {
        self.lock().request_accounts_calls
    }

    pub fn sign_calls(&self) -> usize {
        self.lock().signed_messages.len()
    }

    /// Every (address, message) pair a signature was produced for
    pub fn signed_messages(&self) -> Vec<(Address, String)> {
        self.lock().signed_messages.clone()
    }
}

#[async_trait]
impl SignerProvider for MockSignerProvider {
    fn is_available(&self) -> bool {
        self.lock().available
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let mut state = self.lock();
        state.request_accounts_calls += 1;
        if !state.available {
            return Err(AuthError::CapabilityUnavailable);
        }
        if state.decline_accounts {
            return Err(AuthError::UserDeclined);
        }
        Ok(state.accounts.clone())
    }

    async fn current_accounts(&self) -> Result<Vec<Address>> {
        let state = self.lock();
        if !state.available {
            return Err(AuthError::CapabilityUnavailable);
        }
        Ok(state.accounts.clone())
    }

    async fn sign(&self, message: &str, address: &Address) -> Result<Signature> {
        let mut state = self.lock();
        if !state.available {
            return Err(AuthError::CapabilityUnavailable);
        }
        if state.decline_signing {
            return Err(AuthError::UserDeclined);
        }
        let signature = state.signatures.get(address).cloned().ok_or_else(|| {
            AuthError::Provider(format!("no signature scripted for {address}"))
        })?;
        state
            .signed_messages
            .push((address.clone(), message.to_string()));
        Ok(signature)
    }

    fn subscribe_accounts_changed(&self, listener: ListenerId) -> AccountsSubscription {
        self.hub.subscribe(listener)
    }

    fn unsubscribe_accounts_changed(&self, listener: ListenerId) {
        self.hub.unsubscribe(listener);
    }
}
