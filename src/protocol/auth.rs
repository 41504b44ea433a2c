//! obs-websocket challenge-response authentication.
//!
//! ```text
//! secret         = base64(SHA-256(password ++ salt))
//! authentication = base64(SHA-256(secret ++ challenge))
//! ```
//!
//! The password never leaves this function; only the derived string is
//! sent.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use super::message::AuthChallenge;

/// Computes the `authentication` string for `Identify`.
#[must_use]
pub fn authentication_string(password: &str, salt: &str, challenge: &str) -> String {
    let secret = base64_sha256(password, salt);
    base64_sha256(&secret, challenge)
}

/// Answers a `Hello` challenge with `password`.
#[inline]
#[must_use]
pub fn answer(challenge: &AuthChallenge, password: &str) -> String {
    authentication_string(password, &challenge.salt, &challenge.challenge)
}

fn base64_sha256(first: &str, second: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    STANDARD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "p@ss";
    const SALT: &str = "c2FsdA==";
    const CHALLENGE: &str = "Y2hhbGxlbmdl";

    #[test]
    fn test_deterministic() {
        let first = authentication_string(PASSWORD, SALT, CHALLENGE);
        let second = authentication_string(PASSWORD, SALT, CHALLENGE);
        assert_eq!(first, second);
        // SHA-256 digest is 32 bytes -> 44 base64 chars.
        assert_eq!(first.len(), 44);
    }

    #[test]
    fn test_matches_two_step_derivation() {
        let secret = STANDARD.encode(Sha256::digest(format!("{PASSWORD}{SALT}")));
        let expected = STANDARD.encode(Sha256::digest(format!("{secret}{CHALLENGE}")));
        assert_eq!(authentication_string(PASSWORD, SALT, CHALLENGE), expected);
    }

    #[test]
    fn test_each_input_changes_output() {
        let base = authentication_string(PASSWORD, SALT, CHALLENGE);
        assert_ne!(base, authentication_string("p@sS", SALT, CHALLENGE));
        assert_ne!(base, authentication_string(PASSWORD, "c2FsdB==", CHALLENGE));
        assert_ne!(base, authentication_string(PASSWORD, SALT, "Y2hhbGxlbmdm"));
    }

    #[test]
    fn test_answer_uses_challenge_fields() {
        let challenge = AuthChallenge {
            challenge: CHALLENGE.into(),
            salt: SALT.into(),
        };
        assert_eq!(
            answer(&challenge, PASSWORD),
            authentication_string(PASSWORD, SALT, CHALLENGE)
        );
    }
}
