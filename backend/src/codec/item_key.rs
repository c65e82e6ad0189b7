//! Mapping between image identity and object key
//!
//! `{user_id}/{image_id}_{filename}`. Parsing splits on the first `/` and then on the
//! first `_`, so a filename containing `_` is not recovered exactly, while `image_id`
//! (a UUID, never containing `_`) always is.

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Why an object key could not be mapped back to a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// Key was empty
    #[error("object key is empty")]
    Empty,
    /// No `/` between user and image parts
    #[error("object key has no user separator: {0}")]
    MissingUserSeparator(String),
    /// No `_` between image ID and filename
    #[error("object key has no image separator: {0}")]
    MissingImageSeparator(String),
    /// User or image part was empty
    #[error("object key has an empty identity part: {0}")]
    EmptyIdentity(String),
}

/// Identity recovered from an object key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Owner of the object
    pub user_id: String,
    /// Image the object belongs to
    pub image_id: String,
    /// Everything after the first `_`
    pub filename: String,
}

/// Builds the object key for an image
#[must_use]
pub fn encode(user_id: &str, image_id: &str, filename: &str) -> String {
    format!("{user_id}/{image_id}_{filename}")
}

/// Parses an object key as delivered by S3 event notifications
///
/// The key is URL-unescaped first (`+` is a space, then `%XX` escapes).
///
/// # Errors
///
/// Returns a `KeyParseError` describing why no `(user_id, image_id)` could be recovered
pub fn decode(raw_key: &str) -> Result<ParsedKey, KeyParseError> {
    if raw_key.is_empty() {
        return Err(KeyParseError::Empty);
    }

    let key = unescape(raw_key);
    let (user_id, remainder) = key
        .split_once('/')
        .ok_or_else(|| KeyParseError::MissingUserSeparator(key.clone()))?;
    let (image_id, filename) = remainder
        .split_once('_')
        .ok_or_else(|| KeyParseError::MissingImageSeparator(key.clone()))?;

    if user_id.is_empty() || image_id.is_empty() {
        return Err(KeyParseError::EmptyIdentity(key.clone()));
    }

    Ok(ParsedKey {
        user_id: user_id.to_string(),
        image_id: image_id.to_string(),
        filename: filename.to_string(),
    })
}

fn unescape(raw_key: &str) -> String {
    let plus_decoded = raw_key.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
