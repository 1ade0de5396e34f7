/*
[INPUT]:  Server nonce and wallet address
[OUTPUT]: Challenge message to be signed by the wallet
[POS]:    Auth layer - challenge message format shared with the server
[UPDATE]: Only together with the server, which recomputes this exact string
*/

use crate::types::{Address, Nonce};

/// First line of every challenge message
pub const CHALLENGE_PREAMBLE: &str = "Please sign this message to authenticate with Hikmalayer.";

/// Build the message the wallet signs for a nonce/address pair.
///
/// The server rebuilds the same string to check the signature, so the
/// layout (preamble, blank line, `Nonce:` line, `Address:` line) must not
/// change.
pub fn build_challenge_message(nonce: &Nonce, address: &Address) -> String {
    format!("{CHALLENGE_PREAMBLE}\n\nNonce: {nonce}\nAddress: {address}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_message_layout() {
        let message = build_challenge_message(&Nonce::new("abc123"), &Address::new("0xAA"));
        assert_eq!(
            message,
            "Please sign this message to authenticate with Hikmalayer.\n\nNonce: abc123\nAddress: 0xaa"
        );
    }

    #[test]
    fn test_challenge_message_is_deterministic() {
        let nonce = Nonce::new("abc123");
        let address = Address::new("0xAA");
        let first = build_challenge_message(&nonce, &address);
        for _ in 0..5 {
            assert_eq!(build_challenge_message(&nonce, &address), first);
        }
    }

    #[test]
    fn test_challenge_message_embeds_literal_values() {
        let message = build_challenge_message(
            &Nonce::new("7f1c-uuid"),
            &Address::new("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
        );
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Nonce: 7f1c-uuid");
        assert_eq!(lines[3], "Address: 0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    }
}
