/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Hikmalayer wallet authentication crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod context;
pub mod http;
pub mod storage;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    AccountsChangedHub,
    AccountsSubscription,
    ListenerId,
    LocalKeyProvider,
    MockSignerProvider,
    SessionHandle,
    SessionManager,
    SignerProvider,
    TokenData,
    build_challenge_message,
};

pub use config::AuthConfig;
pub use context::AuthContext;

// Re-export commonly used types from http
pub use http::{
    ApiClient,
    AuthError,
    AuthenticatedClient,
    ChallengeClient,
    ClientConfig,
    RequestOptions,
    Result,
};

pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, ReconnectHint};

// Re-export all types
pub use types::*;
