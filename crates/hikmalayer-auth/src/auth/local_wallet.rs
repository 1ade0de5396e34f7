/*
[INPUT]:  EVM private key (hex string)
[OUTPUT]: personal_sign signatures and the key's address
[POS]:    Auth layer - local-key wallet provider implementation
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::str::FromStr;

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::auth::provider::{AccountsChangedHub, AccountsSubscription, ListenerId, SignerProvider};
use crate::http::{AuthError, Result};
use crate::types::{Address, Signature};

/// Wallet provider backed by a single in-process EVM key
///
/// The key is always authorized, so account enumeration never prompts and
/// never changes. Signatures follow EIP-191 `personal_sign`, which is what
/// the server recovers addresses from.
pub struct LocalKeyProvider {
    signer: PrivateKeySigner,
    address: Address,
    hub: AccountsChangedHub,
}

impl LocalKeyProvider {
    /// Create a provider from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str) -> Result<Self> {
        let private_key_hex = private_key_hex.trim();
        let private_key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| AuthError::Config(format!("Invalid EVM private key: {e}")))?;

        let address = Address::new(signer.address().to_checksum(None));
        let hub = AccountsChangedHub::with_baseline(vec![address.clone()]);

        Ok(Self {
            signer,
            address,
            hub,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

#[async_trait]
impl SignerProvider for LocalKeyProvider {
    fn is_available(&self) -> bool {
        true
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.address.clone()])
    }

    async fn current_accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.address.clone()])
    }

    async fn sign(&self, message: &str, address: &Address) -> Result<Signature> {
        if address != &self.address {
            return Err(AuthError::Provider(format!(
                "address {address} is not controlled by this key"
            )));
        }

        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to sign message: {e}")))?;

        // alloy's Signature as_bytes() returns [r, s, v]
        Ok(Signature::new(format!("0x{}", hex::encode(signature.as_bytes()))))
    }

    fn subscribe_accounts_changed(&self, listener: ListenerId) -> AccountsSubscription {
        self.hub.subscribe(listener)
    }

    fn unsubscribe_accounts_changed(&self, listener: ListenerId) {
        self.hub.unsubscribe(listener);
    }
}
