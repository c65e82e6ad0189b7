/// Object key construction and parsing
pub mod item_key;
/// Opaque pagination tokens
pub mod page_token;
