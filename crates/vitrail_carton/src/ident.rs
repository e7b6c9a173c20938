//! Random id tokens for DOM nodes.
//!
//! Ids look like `carousel-3f9a1c2b7d4e`: a caller-supplied prefix followed by
//! 12 hex digits taken from a v4 UUID (48 random bits).

use compact_str::{format_compact, CompactString};
use uuid::Uuid;

/// Number of hex digits kept from the UUID.
const TOKEN_LEN: usize = 12;

/// Attempts made by [`generate_unique_id`] before falling back to a full UUID.
const MAX_SHORT_ATTEMPTS: usize = 16;

/// Generate a new id token with the given prefix.
pub fn generate_id(prefix: &str) -> CompactString {
    let uuid = Uuid::new_v4().simple().to_string();
    join(prefix, &uuid[..TOKEN_LEN])
}

/// Generate an id token that `is_taken` does not report as already in use.
///
/// Short tokens are retried a bounded number of times; after that the full
/// 32-digit UUID is used.
pub fn generate_unique_id(prefix: &str, is_taken: impl Fn(&str) -> bool) -> CompactString {
    for _ in 0..MAX_SHORT_ATTEMPTS {
        let id = generate_id(prefix);
        if !is_taken(&id) {
            return id;
        }
    }
    join(prefix, &Uuid::new_v4().simple().to_string())
}

fn join(prefix: &str, token: &str) -> CompactString {
    if prefix.is_empty() {
        CompactString::from(token)
    } else {
        format_compact!("{}-{}", prefix, token)
    }
}
