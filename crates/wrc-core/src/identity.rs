//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers of the collateral protocol.
//! These prevent accidental identifier confusion — you cannot pass a
//! `TokenId` where a `WrId` is expected, and you cannot hand a raw
//! string to an API that wants a validated receipt identifier.
//!
//! ## Security Invariant
//!
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion where a caller substitutes one kind of
//! identifier for another. All constructors validate their input.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::CoreError;

/// Maximum accepted length for string-keyed identifiers.
const MAX_ID_LEN: usize = 128;

/// Unique identifier for a warehouse receipt.
///
/// Assigned by the registering party, unique for the lifetime of the
/// registry. Non-empty, at most 128 characters, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WrId(String);

impl WrId {
    /// Validate and wrap a warehouse receipt identifier.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            return Err(CoreError::Validation("wr id must not be empty".into()));
        }
        if s.len() > MAX_ID_LEN {
            return Err(CoreError::Validation(format!(
                "wr id exceeds {MAX_ID_LEN} characters: {} chars",
                s.len()
            )));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(CoreError::Validation(format!(
                "wr id must not contain whitespace: {s:?}"
            )));
        }
        Ok(Self(s))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WrId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wr:{}", self.0)
    }
}

/// Identifier for the fungible token an escrow settles in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Validate and wrap a token identifier.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            return Err(CoreError::Validation("token id must not be empty".into()));
        }
        if s.len() > MAX_ID_LEN {
            return Err(CoreError::Validation(format!(
                "token id exceeds {MAX_ID_LEN} characters: {} chars",
                s.len()
            )));
        }
        Ok(Self(s))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token:{}", self.0)
    }
}

/// An oracle epoch / round number.
///
/// Rounds are monotonically increasing units of oracle time. They bound
/// how fresh an attestation must be to be consumed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RoundId(pub u64);

impl RoundId {
    /// The raw round number.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round:{}", self.0)
    }
}

/// A fungible token amount.
///
/// Amounts are integers in the token's smallest unit. Floats never enter
/// the protocol; the canonicalization layer rejects them outright.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The raw integer value.
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a milestone escrow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EscrowId(Uuid);

impl EscrowId {
    /// Generate a new random escrow identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an escrow identifier from its canonical UUID form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::Validation(format!("invalid escrow id {s:?}: {e}")))
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EscrowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EscrowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "escrow:{}", self.0)
    }
}

/// A 20-byte account address.
///
/// Addresses identify issuers, borrowers (SMEs), lenders, and escrow
/// custody accounts. An address is derived from a signing key by the
/// crypto layer, or parsed from its hex form at the API boundary.
///
/// Serializes as a lowercase hex string with `0x` prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Wrap raw 20 address bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw 20-byte address.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse an address from a 40-character hex string, with or without
    /// a `0x` prefix. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let hex = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let hex = hex.to_lowercase();
        if hex.len() != 40 {
            return Err(CoreError::Validation(format!(
                "address hex must be 40 chars, got {}",
                hex.len()
            )));
        }
        let bytes = hex_to_bytes(&hex).map_err(CoreError::Validation)?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Render the address as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        let body: String = self.0.iter().map(|b| format!("{b:02x}")).collect();
        format!("0x{body}")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::parse(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Decode an even-length ASCII hex string.
///
/// Non-ASCII input is rejected up front; the two-character slices below
/// are only safe once every byte is a char boundary.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if !hex.is_ascii() {
        return Err("hex string must be ASCII".to_string());
    }
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}
