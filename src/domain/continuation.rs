//! Opaque cursor for paginated activity queries.
//!
//! The token is the hex encoding of a small versioned JSON document holding
//! the sort key of the last record returned. Clients must treat it as an
//! opaque string and only hand it back unchanged.

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

const TOKEN_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct TokenBody {
    v: u8,
    sk: String,
}

/// Resume position within a sorted activity partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken {
    last_sort_key: String,
}

impl ContinuationToken {
    /// Cursor positioned after `last_sort_key`.
    #[must_use]
    pub fn after(last_sort_key: impl Into<String>) -> Self {
        Self {
            last_sort_key: last_sort_key.into(),
        }
    }

    /// Sort key of the last record already delivered.
    #[must_use]
    pub fn last_sort_key(&self) -> &str {
        &self.last_sort_key
    }

    /// Serializes the cursor into its opaque wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        let body = TokenBody {
            v: TOKEN_VERSION,
            sk: self.last_sort_key.clone(),
        };
        // Serializing a struct of a u8 and a String cannot fail.
        let json = serde_json::to_vec(&body).unwrap_or_default();
        hex::encode(json)
    }

    /// Parses a client-supplied token and checks it belongs to `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] if the token is malformed,
    /// carries an unknown version, or points outside `prefix`.
    pub fn decode(raw: &str, prefix: &str) -> Result<Self, TrackerError> {
        let invalid =
            || TrackerError::InvalidInput("lastKey is not a valid continuation token".to_string());

        let bytes = hex::decode(raw.trim()).map_err(|_| invalid())?;
        let body: TokenBody = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
        if body.v != TOKEN_VERSION || !body.sk.starts_with(prefix) {
            return Err(invalid());
        }
        Ok(Self::after(body.sk))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_own_encoding() {
        let token = ContinuationToken::after("w1#q1#0001#a");
        let Ok(decoded) = ContinuationToken::decode(&token.encode(), "w1#q1#") else {
            panic!("token should decode");
        };
        assert_eq!(decoded, token);
    }

    #[test]
    fn token_for_other_prefix_rejected() {
        let token = ContinuationToken::after("w2#q1#0001#a").encode();
        assert!(ContinuationToken::decode(&token, "w1#q1#").is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(ContinuationToken::decode("not-hex", "w1#").is_err());
        assert!(ContinuationToken::decode(&hex::encode("{}"), "w1#").is_err());
    }

    #[test]
    fn token_is_opaque() {
        let encoded = ContinuationToken::after("w1#q1#0001#a").encode();
        assert!(!encoded.contains('#'));
        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
