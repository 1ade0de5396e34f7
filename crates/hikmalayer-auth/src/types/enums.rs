/*
[INPUT]:  Session lifecycle definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - session status values
[UPDATE]: When session states are added or renamed
*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of the wallet session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Authenticating,
    Connected,
    Error,
}

impl SessionStatus {
    /// A connect or authenticate sequence is running
    pub fn is_busy(self) -> bool {
        matches!(self, SessionStatus::Connecting | SessionStatus::Authenticating)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Authenticating => "authenticating",
            SessionStatus::Connected => "connected",
            SessionStatus::Error => "error",
        };
        f.write_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(SessionStatus::default(), SessionStatus::Disconnected);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::Authenticating).unwrap();
        assert_eq!(json, "\"authenticating\"");
        assert_eq!(SessionStatus::Connected.to_string(), "connected");
    }

    #[test]
    fn test_busy_statuses() {
        assert!(SessionStatus::Connecting.is_busy());
        assert!(SessionStatus::Authenticating.is_busy());
        assert!(!SessionStatus::Connected.is_busy());
        assert!(!SessionStatus::Error.is_busy());
    }
}
