//! # Challenge Messages
//!
//! The string a user signs to prove ownership of a name:
//!
//! ```text
//! login <uri>?name=<percent-encoded id> <nonce>
//! ```
//!
//! Provider and signer build it independently, so both must go through
//! [`build_challenge`]. The name is percent-encoded with the RFC 3986
//! unreserved set, which keeps ordinary nicks (`[a-z0-9-]`) unchanged.

use serde::{Deserialize, Serialize};

use crate::config::{CHALLENGE_PREFIX, NAME_QUERY_PARAM};

/// The identity URL for `id` under the provider's `uri`.
pub fn identity_url(uri: &str, id: &str) -> String {
    format!("{}?{}={}", uri, NAME_QUERY_PARAM, urlencoding::encode(id))
}

/// Assemble the full challenge message for `id`.
pub fn build_challenge(uri: &str, id: &str, nonce: &str) -> String {
    format!("{} {} {}", CHALLENGE_PREFIX, identity_url(uri, id), nonce)
}

/// Page URI and nonce of one login attempt. The name is filled in later,
/// once the user has typed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub uri: String,
    pub nonce: String,
}

impl Challenge {
    pub fn new(uri: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            nonce: nonce.into(),
        }
    }

    /// The message to sign for `id`.
    pub fn message_for(&self, id: &str) -> String {
        build_challenge(&self.uri, id, &self.nonce)
    }

    /// The identity URL `id` will be asserted as.
    pub fn identity_for(&self, id: &str) -> String {
        identity_url(&self.uri, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_is_not_escaped() {
        let msg = build_challenge("https://nameid.org/", "domob", "abc123");
        assert_eq!(msg, "login https://nameid.org/?name=domob abc123");
    }

    #[test]
    fn special_characters_are_percent_encoded() {
        let url = identity_url("https://nameid.org/", "a b&c/d");
        assert_eq!(url, "https://nameid.org/?name=a%20b%26c%2Fd");
    }

    #[test]
    fn unreserved_characters_pass_through() {
        let url = identity_url("https://nameid.org/", "nick-name_1.x~");
        assert_eq!(url, "https://nameid.org/?name=nick-name_1.x~");
    }

    #[test]
    fn non_ascii_is_utf8_percent_encoded() {
        let url = identity_url("https://nameid.org/", "ü");
        assert_eq!(url, "https://nameid.org/?name=%C3%BC");
    }

    #[test]
    fn challenge_struct_matches_free_function() {
        let ch = Challenge::new("https://nameid.org/", "ff00");
        assert_eq!(
            ch.message_for("dani"),
            build_challenge("https://nameid.org/", "dani", "ff00")
        );
        assert_eq!(ch.identity_for("dani"), "https://nameid.org/?name=dani");
    }

    #[test]
    fn empty_name_still_forms_a_message() {
        let ch = Challenge::new("https://nameid.org/", "n");
        assert_eq!(ch.message_for(""), "login https://nameid.org/?name= n");
    }
}
