/*
[INPUT]:  Challenge protocol response schema
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub token: String,
    /// Address the server bound the session to, when reported
    #[serde(default)]
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_response_without_address() {
        let response: VerifyResponse = serde_json::from_str(r#"{"token":"TOK1"}"#).unwrap();
        assert_eq!(response.token, "TOK1");
        assert!(response.address.is_none());
    }
}
