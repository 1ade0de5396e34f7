/*
[INPUT]:  Wallet provider, challenge client and persisted hint
[OUTPUT]: Session state, token ownership and wallet abstractions
[POS]:    Auth layer - turns wallet signatures into an authenticated session
[UPDATE]: When auth flow or wallet integrations change
*/

pub mod local_wallet;
pub mod message;
pub mod mock_wallet;
pub mod provider;
pub mod session;
pub mod state;

pub use local_wallet::LocalKeyProvider;
pub use message::{CHALLENGE_PREAMBLE, build_challenge_message};
pub use mock_wallet::MockSignerProvider;
pub use provider::{AccountsChangedHub, AccountsSubscription, ListenerId, SignerProvider};
pub use session::SessionManager;
pub use state::{SessionHandle, TokenData};
