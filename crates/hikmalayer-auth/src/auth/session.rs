/*
[INPUT]:  Wallet provider, challenge client, reconnect-hint store
[OUTPUT]: Authenticated session state and the token behind it
[POS]:    Auth layer - orchestrates connect, re-authentication and teardown
[UPDATE]: When session transitions or account-change handling change
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::message::build_challenge_message;
use crate::auth::provider::{ListenerId, SignerProvider};
use crate::auth::state::{SessionCell, SessionHandle, TokenData};
use crate::http::{AuthError, ChallengeClient, Result};
use crate::storage::{KeyValueStore, ReconnectHint};
use crate::types::{Address, SessionState, SessionStatus, SessionToken, Signature};

/// Tracks the single in-flight connect/authenticate sequence
#[derive(Debug, Default)]
struct SequenceGate {
    /// Bumped by `disconnect()`; a sequence started under an older
    /// generation is abandoned and may no longer touch the gate.
    generation: u64,
    in_flight: bool,
    /// Latest account-change notification received while in flight
    pending: Option<Vec<Address>>,
}

struct Inner {
    provider: Arc<dyn SignerProvider>,
    challenge: ChallengeClient,
    hint: ReconnectHint,
    cell: Arc<SessionCell>,
    gate: Mutex<SequenceGate>,
    listener_id: ListenerId,
    listener: Mutex<Option<CancellationToken>>,
}

/// Wallet session state machine
///
/// The one owner of the session token. Cloning yields another handle to
/// the same session. Consumers that only read should get a
/// [`SessionHandle`] through [`SessionManager::handle`].
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn SignerProvider>,
        challenge: ChallengeClient,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                challenge,
                hint: ReconnectHint::new(store),
                cell: Arc::new(SessionCell::new()),
                gate: Mutex::new(SequenceGate::default()),
                listener_id: ListenerId::new(),
                listener: Mutex::new(None),
            }),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.inner.cell.clone())
    }

    pub fn state(&self) -> SessionState {
        self.inner.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.cell.subscribe()
    }

    /// Connect the wallet and authenticate its first account
    ///
    /// Ignored while another sequence is in flight and a no-op while
    /// connected; both return the current state. A failed attempt leaves
    /// the session in `Error` and returns the cause.
    pub async fn connect(&self) -> Result<SessionState> {
        let Some(generation) = self.try_begin_sequence() else {
            debug!("connect ignored: a sequence is already in flight");
            return Ok(self.state());
        };

        let result = if self.state().status == SessionStatus::Connected {
            debug!("connect ignored: already connected");
            Ok(())
        } else {
            self.run_connect(generation).await
        };

        self.finish_sequence(generation).await;
        result.map(|()| self.state())
    }

    /// Silent re-authentication on startup from the reconnect hint
    pub async fn restore(&self) -> Result<SessionState> {
        let Some(hinted) = self.inner.hint.load() else {
            return Ok(self.state());
        };
        let generation = match self.try_begin_sequence() {
            Some(generation) if self.state().status == SessionStatus::Disconnected => generation,
            Some(generation) => {
                debug!("restore skipped: session already active");
                self.finish_sequence(generation).await;
                return Ok(self.state());
            }
            None => {
                debug!("restore skipped: a sequence is already in flight");
                return Ok(self.state());
            }
        };

        let result = self.run_restore(generation, hinted).await;
        self.finish_sequence(generation).await;
        result.map(|()| self.state())
    }

    /// Tear the session down; callable from any state and idempotent
    ///
    /// A sequence still waiting on the wallet or the server is abandoned,
    /// so a following `connect()` starts afresh.
    pub fn disconnect(&self) {
        {
            let mut gate = self.lock_gate();
            gate.generation += 1;
            gate.in_flight = false;
            gate.pending = None;
            self.stop_listener();
            self.inner.cell.reset();
        }
        self.inner.hint.clear();
        info!("wallet disconnected");
    }

    /// Disconnect locally, then ask the server to drop the token
    ///
    /// The local teardown happens first and does not depend on the server.
    pub async fn logout(&self) {
        let token = self.inner.cell.token().map(|data| data.token);
        self.disconnect();
        if let Some(token) = token {
            self.revoke_remote(&token).await;
        }
    }

    /// Sign an arbitrary message with the connected account
    ///
    /// Fails with `NotAuthenticated` unless the session is connected.
    pub async fn sign_message(&self, message: &str) -> Result<Signature> {
        let Some(address) = self.inner.cell.token().map(|data| data.address) else {
            return Err(AuthError::NotAuthenticated);
        };
        self.inner.provider.sign(message, &address).await
    }

    /// Apply an account-change notification from the wallet provider
    ///
    /// Deferred while a sequence is in flight; only the latest deferred
    /// notification is applied once that sequence resolves.
    pub async fn handle_accounts_changed(&self, accounts: Vec<Address>) {
        let generation = {
            let mut gate = self.lock_gate();
            if gate.in_flight {
                debug!(
                    accounts = accounts.len(),
                    "account change deferred until the running sequence resolves"
                );
                gate.pending = Some(accounts);
                return;
            }
            gate.in_flight = true;
            gate.generation
        };

        self.apply_accounts_change(generation, accounts).await;
        self.finish_sequence(generation).await;
    }

    fn lock_gate(&self) -> MutexGuard<'_, SequenceGate> {
        self.inner.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the gate; returns the generation the new sequence runs under
    fn try_begin_sequence(&self) -> Option<u64> {
        let mut gate = self.lock_gate();
        if gate.in_flight {
            return None;
        }
        gate.in_flight = true;
        Some(gate.generation)
    }

    /// Drain deferred notifications, then release the gate
    ///
    /// An abandoned sequence leaves the gate alone: it already belongs to
    /// whatever started after `disconnect()`.
    async fn finish_sequence(&self, generation: u64) {
        loop {
            let pending = {
                let mut gate = self.lock_gate();
                if gate.generation != generation {
                    return;
                }
                match gate.pending.take() {
                    Some(accounts) => accounts,
                    None => {
                        gate.in_flight = false;
                        return;
                    }
                }
            };
            self.apply_accounts_change(generation, pending).await;
        }
    }

    async fn run_connect(&self, generation: u64) -> Result<()> {
        let epoch = self.inner.cell.begin_connecting();
        info!("connecting wallet");

        if !self.inner.provider.is_available() {
            return Err(self.fail(epoch, AuthError::CapabilityUnavailable));
        }

        let accounts = match self.inner.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => return Err(self.fail(epoch, err)),
        };

        let Some(address) = accounts.into_iter().next() else {
            info!("wallet returned no accounts; treating as cancelled");
            self.inner.cell.cancel(epoch);
            return Ok(());
        };

        self.authenticate(generation, address).await
    }

    async fn run_restore(&self, generation: u64, hinted: Address) -> Result<()> {
        if !self.inner.provider.is_available() {
            info!(address = %hinted, "wallet provider unavailable; keeping reconnect hint");
            return Ok(());
        }

        match self.inner.provider.current_accounts().await {
            Ok(accounts) if accounts.contains(&hinted) => {
                info!(address = %hinted, "restoring wallet session");
                self.authenticate(generation, hinted).await
            }
            Ok(_) => {
                info!(address = %hinted, "hinted account no longer authorized; discarding hint");
                self.inner.hint.clear();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to enumerate wallet accounts; discarding hint");
                self.inner.hint.clear();
                Ok(())
            }
        }
    }

    /// Run the nonce challenge for `address`
    async fn authenticate(&self, generation: u64, address: Address) -> Result<()> {
        // Drops any previous token before the nonce request goes out.
        let epoch = {
            let gate = self.lock_gate();
            if gate.generation != generation {
                debug!(address = %address, "sequence abandoned before authenticating");
                return Ok(());
            }
            let epoch = self.inner.cell.begin_authenticating(address.clone());
            self.ensure_listener();
            epoch
        };
        debug!(address = %address, "authenticating");

        let token = match self.run_challenge(&address).await {
            Ok(token) => token,
            Err(err) => return Err(self.fail(epoch, err)),
        };

        if self
            .inner
            .cell
            .complete(epoch, TokenData::new(token.clone(), address.clone()))
        {
            self.inner.hint.save(&address);
            info!(address = %address, "wallet session established");
        } else {
            debug!(address = %address, "session changed while authenticating; discarding token");
            self.revoke_remote(&token).await;
        }
        Ok(())
    }

    async fn run_challenge(&self, address: &Address) -> Result<SessionToken> {
        let challenge = &self.inner.challenge;
        let nonce = challenge.request_nonce(address).await?;
        let message = build_challenge_message(&nonce, address);
        let signature = self.inner.provider.sign(&message, address).await?;
        challenge.verify(address, &message, &signature, &nonce).await
    }

    async fn apply_accounts_change(&self, generation: u64, accounts: Vec<Address>) {
        let state = self.state();
        if state.status != SessionStatus::Connected {
            debug!(status = %state.status, "ignoring account change");
            return;
        }

        match accounts.into_iter().next() {
            None => {
                info!("wallet disconnected externally");
                self.disconnect();
            }
            Some(address) if state.address.as_ref() == Some(&address) => {
                debug!(address = %address, "account change does not affect the session");
            }
            Some(address) => {
                info!(to = %address, "wallet account switched; re-authenticating");
                // A failure is recorded in the session state.
                let _ = self.authenticate(generation, address).await;
            }
        }
    }

    /// Record `err` as the session error if `epoch` is current
    fn fail(&self, epoch: u64, err: AuthError) -> AuthError {
        if self.inner.cell.fail(epoch, err.to_string()) {
            self.stop_listener();
            warn!(error = %err, "wallet authentication failed");
        } else {
            debug!(error = %err, "superseded sequence failed");
        }
        err
    }

    async fn revoke_remote(&self, token: &SessionToken) {
        if let Err(err) = self.inner.challenge.logout(token).await {
            warn!(error = %err, "server-side logout failed");
        }
    }

    fn ensure_listener(&self) {
        let mut listener = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if listener.is_some() {
            return;
        }

        let mut subscription = self
            .inner
            .provider
            .subscribe_accounts_changed(self.inner.listener_id);
        let cancel = CancellationToken::new();
        *listener = Some(cancel.clone());

        let session: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = subscription.recv() => {
                        let Some(accounts) = next else { break };
                        let Some(inner) = session.upgrade() else { break };
                        SessionManager { inner }.handle_accounts_changed(accounts).await;
                    }
                }
            }
            debug!("account-change listener stopped");
        });
    }

    fn stop_listener(&self) {
        let cancel = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(cancel) = cancel {
            cancel.cancel();
            self.inner
                .provider
                .unsubscribe_accounts_changed(self.inner.listener_id);
        }
    }
}
