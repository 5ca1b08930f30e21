//! The discriminated payment-proof value.
//!
//! A client retrying a gated request attaches proof of payment in the
//! `x-payment` header. The proof is either a transaction hash for direct
//! on-chain verification or an opaque signed receipt for facilitator
//! verification. Classification is purely syntactic.

use std::str::FromStr;
use std::sync::LazyLock;

use alloy_primitives::TxHash;
use regex::Regex;

/// Matches a 32-byte transaction hash: `0x` plus 64 hex digits.
static TX_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^0x[a-fA-F0-9]{64}$").expect("valid tx hash regex"));

/// Proof of payment supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentProof {
    /// A transaction hash referencing an on-chain transfer.
    TxHash(TxHash),
    /// An opaque signed receipt issued by a facilitator.
    Receipt(String),
}

impl PaymentProof {
    /// Classifies a raw header value.
    ///
    /// A `0x`-prefixed 64-hex-digit string is a transaction hash; any other
    /// non-empty value is treated as a facilitator receipt. Returns `None`
    /// for an empty or whitespace-only value.
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let value = header_value.trim();
        if value.is_empty() {
            return None;
        }
        if TX_HASH_RE.is_match(value) {
            // The regex guarantees a well-formed 32-byte hex string.
            let hash = TxHash::from_str(value).ok()?;
            return Some(Self::TxHash(hash));
        }
        Some(Self::Receipt(value.to_owned()))
    }
}
