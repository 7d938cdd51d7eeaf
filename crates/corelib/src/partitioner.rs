//! Key-to-owner assignment.
//!
//! Ownership is a pure function of the key and the registered membership:
//! hash the key to a `u64` token, reduce modulo the membership size, and
//! select the node at that rank in ascending-id order. Distribution and any
//! later query must agree on the owner as long as membership is unchanged,
//! so nothing here may depend on call history.

use crate::node::NodeIdentity;
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

/// Converts a key into its numeric token.
///
/// Numeric keys are used directly so ownership is readable from the key
/// itself; anything else falls back to a deterministic SipHash-1-3 of the
/// key bytes. Never fails.
pub fn key_token(key: &str) -> u64 {
    match key.trim().parse::<u64>() {
        Ok(n) => n,
        Err(_) => hash_bytes(key.as_bytes()),
    }
}

/// Deterministic hash of arbitrary bytes, shared with the record-source
/// fallback for rows with no key field.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Returns the node owning `key` out of the given identities.
///
/// The slice is ranked ascending by id internally, so the caller's iteration
/// order cannot change the result. Returns `None` only for an empty
/// membership.
pub fn owner_of<'a>(key: &str, identities: &'a [NodeIdentity]) -> Option<&'a NodeIdentity> {
    if identities.is_empty() {
        return None;
    }
    let mut ranked: Vec<&NodeIdentity> = identities.iter().collect();
    ranked.sort_by_key(|identity| identity.id);
    let rank = (key_token(key) % ranked.len() as u64) as usize;
    Some(ranked[rank])
}
