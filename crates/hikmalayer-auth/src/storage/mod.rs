/*
[INPUT]:  Non-secret key-value pairs (reconnect hint)
[OUTPUT]: Best-effort persistence independent of the host environment
[POS]:    Storage layer - the only state written outside the in-memory session
[UPDATE]: When adding store backends or persisted keys
*/

pub mod hint;
pub mod kv;

pub use hint::{RECONNECT_HINT_KEY, ReconnectHint};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
