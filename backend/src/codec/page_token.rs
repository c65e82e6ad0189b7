//! Opaque pagination tokens
//!
//! A token is the table's continuation key as compact JSON, URL-safe base64 encoded.
//! Decoding is lenient: anything that does not decode cleanly is treated as no token.

use backend_storage::image_record::ContinuationKey;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};

/// Encodes a continuation key into a URL-safe token
#[must_use]
pub fn encode(key: &ContinuationKey) -> String {
    // A map of strings always serializes
    let json = serde_json::to_vec(key).unwrap_or_default();
    URL_SAFE.encode(json)
}

/// Decodes a token produced by [`encode`]
///
/// Returns `None` for malformed tokens and for tokens holding an empty key.
#[must_use]
pub fn decode(token: &str) -> Option<ContinuationKey> {
    let bytes = URL_SAFE
        .decode(token.trim())
        .map_err(|e| tracing::warn!("Ignoring page token that is not valid base64: {e}"))
        .ok()?;

    serde_json::from_slice::<ContinuationKey>(&bytes)
        .map_err(|e| tracing::warn!("Ignoring page token that does not hold a continuation key: {e}"))
        .ok()
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use pretty_assertions::assert_eq;

    fn continuation(pairs: &[(&str, &str)]) -> ContinuationKey {
        ContinuationKey::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_token_roundtrip() {
        let key = continuation(&[("user_id", "alice"), ("image_id", "next")]);

        let token = encode(&key);

        assert_eq!(decode(&token), Some(key));
    }

    #[test]
    fn test_token_is_url_safe() {
        // Characters that push standard base64 into '+' and '/'
        let key = continuation(&[("user_id", "???>>>"), ("image_id", "~~~???")]);

        let token = encode(&key);

        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert_eq!(decode(&token), Some(key));
    }

    #[test]
    fn test_token_reads_table_key_json() {
        let token = URL_SAFE.encode(r#"{"user_id":"alice","image_id":"img7"}"#);

        let key = decode(&token).unwrap();

        assert_eq!(key.get("image_id"), Some("img7"));
    }

    #[test]
    fn test_garbage_decodes_to_none() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("!!!not-base64!!!"), None);
        assert_eq!(decode(&URL_SAFE.encode("not json")), None);
        assert_eq!(decode(&URL_SAFE.encode("[1,2,3]")), None);
        assert_eq!(decode(&URL_SAFE.encode(r#"{"user_id":{"S":"alice"}}"#)), None);
        assert_eq!(decode(&URL_SAFE.encode([0xff, 0xfe, 0x00])), None);
    }

    #[test]
    fn test_empty_key_decodes_to_none() {
        assert_eq!(decode(&encode(&ContinuationKey::default())), None);
    }
}
