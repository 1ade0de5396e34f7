/*
[INPUT]:  Session transitions requested by the session manager
[OUTPUT]: Consistent state snapshots, the held token, read-only session views
[POS]:    Auth layer - single owner of the session token
[UPDATE]: When session fields or token metadata change
*/

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::types::{Address, SessionState, SessionStatus, SessionToken};

/// Held token with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: SessionToken,
    pub address: Address,
    pub issued_at: DateTime<Utc>,
}

impl TokenData {
    pub fn new(token: SessionToken, address: Address) -> Self {
        Self {
            token,
            address,
            issued_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct CellData {
    state: SessionState,
    token: Option<TokenData>,
    // Bumped by every transition that starts or ends a sequence, so a
    // sequence that was superseded cannot write its outcome.
    epoch: u64,
}

/// State and token behind one lock
///
/// The token is only ever present while the status is `Connected`; every
/// transition away from `Connected` drops it in the same critical section
/// that changes the status.
#[derive(Debug)]
pub(crate) struct SessionCell {
    data: RwLock<CellData>,
    publisher: watch::Sender<SessionState>,
}

impl SessionCell {
    pub(crate) fn new() -> Self {
        let (publisher, _) = watch::channel(SessionState::default());
        Self {
            data: RwLock::new(CellData::default()),
            publisher,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CellData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CellData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, data: &CellData) {
        self.publisher.send_replace(data.state.clone());
    }

    pub(crate) fn snapshot(&self) -> SessionState {
        self.read().state.clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.publisher.subscribe()
    }

    /// Token, only while connected
    pub(crate) fn token(&self) -> Option<TokenData> {
        let data = self.read();
        match data.state.status {
            SessionStatus::Connected => data.token.clone(),
            _ => None,
        }
    }

    /// Enter `Connecting`; returns the epoch of the new sequence
    pub(crate) fn begin_connecting(&self) -> u64 {
        let mut data = self.write();
        data.epoch += 1;
        data.token = None;
        data.state = SessionState {
            status: SessionStatus::Connecting,
            address: None,
            error: None,
        };
        self.publish(&data);
        data.epoch
    }

    /// Enter `Authenticating` for `address`, dropping any previous token
    pub(crate) fn begin_authenticating(&self, address: Address) -> u64 {
        let mut data = self.write();
        data.epoch += 1;
        data.token = None;
        data.state = SessionState {
            status: SessionStatus::Authenticating,
            address: Some(address),
            error: None,
        };
        self.publish(&data);
        data.epoch
    }

    /// Enter `Connected` if `epoch` is still current
    pub(crate) fn complete(&self, epoch: u64, token: TokenData) -> bool {
        let mut data = self.write();
        if data.epoch != epoch {
            return false;
        }
        data.state = SessionState {
            status: SessionStatus::Connected,
            address: Some(token.address.clone()),
            error: None,
        };
        data.token = Some(token);
        self.publish(&data);
        true
    }

    /// Enter `Error` if `epoch` is still current; the address is kept
    pub(crate) fn fail(&self, epoch: u64, cause: String) -> bool {
        let mut data = self.write();
        if data.epoch != epoch {
            return false;
        }
        data.token = None;
        data.state.status = SessionStatus::Error;
        data.state.error = Some(cause);
        self.publish(&data);
        true
    }

    /// Back to `Disconnected` if `epoch` is still current
    pub(crate) fn cancel(&self, epoch: u64) -> bool {
        let mut data = self.write();
        if data.epoch != epoch {
            return false;
        }
        data.token = None;
        data.state = SessionState::default();
        self.publish(&data);
        true
    }

    /// Unconditionally back to `Disconnected`, superseding any sequence
    pub(crate) fn reset(&self) {
        let mut data = self.write();
        data.epoch += 1;
        data.token = None;
        data.state = SessionState::default();
        self.publish(&data);
    }
}

/// Read-only view of the session handed to consumers
///
/// Holds no token of its own; every read goes to the session cell.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    cell: Arc<SessionCell>,
}

impl SessionHandle {
    pub(crate) fn new(cell: Arc<SessionCell>) -> Self {
        Self { cell }
    }

    pub fn state(&self) -> SessionState {
        self.cell.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.cell.snapshot().status
    }

    pub fn is_connected(&self) -> bool {
        self.status() == SessionStatus::Connected
    }

    /// Connected address, if any
    pub fn address(&self) -> Option<Address> {
        self.cell.token().map(|data| data.address)
    }

    /// Current bearer token; `None` unless the session is connected
    pub fn bearer_token(&self) -> Option<SessionToken> {
        self.cell.token().map(|data| data.token)
    }

    /// When the current token was issued
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.cell.token().map(|data| data.issued_at)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.cell.subscribe()
    }
}
