/*
[INPUT]:  Connected address from the session manager
[OUTPUT]: Best-effort reconnect hint for silent re-authentication
[POS]:    Storage layer - the only persisted session datum
[UPDATE]: When the hint key or its failure handling changes
*/

use std::sync::Arc;

use tracing::warn;

use crate::storage::KeyValueStore;
use crate::types::Address;

/// Key under which the last connected address is kept
pub const RECONNECT_HINT_KEY: &str = "walletAccount";

/// Last connected address, used only to attempt silent re-authentication
///
/// Every operation is best-effort: store failures are logged and never
/// block a session transition.
#[derive(Clone)]
pub struct ReconnectHint {
    store: Arc<dyn KeyValueStore>,
}

impl ReconnectHint {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Option<Address> {
        match self.store.get(RECONNECT_HINT_KEY) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()).map(Address::new),
            Err(err) => {
                warn!(error = %err, "failed to read reconnect hint");
                None
            }
        }
    }

    pub fn save(&self, address: &Address) {
        if let Err(err) = self.store.set(RECONNECT_HINT_KEY, address.as_str()) {
            warn!(error = %err, address = %address, "failed to persist reconnect hint");
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.remove(RECONNECT_HINT_KEY) {
            warn!(error = %err, "failed to clear reconnect hint");
        }
    }
}
