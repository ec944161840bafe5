//! Canonical Primitive Types for the Hallmark Ledger
//!
//! Rule: No String identifiers in ledger state. Ever.
//!
//! These types are the foundational building blocks for all ledger-critical
//! data structures. They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Token and currency amounts in atomic units (supports up to ~340 undecillion)
pub type Amount = u128;

/// Basis points for percentage calculations (10000 = 100%)
pub type Bps = u16;

/// Unix timestamp in seconds, supplied by the host per operation
pub type Timestamp = u64;

/// Maximum basis points (100%)
pub const MAX_BPS: Bps = 10_000;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// 32-byte address (derived from public key)
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed Address
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// ASSET TYPES
// ============================================================================

/// Opaque asset identifier, assigned monotonically by the registry
#[derive(
    Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default,
)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Create a new AssetId from a raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AssetId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Globally unique serial number stamped into an asset's metadata.
///
/// Distinct from [`AssetId`]: the serial survives burn-and-restore, the
/// storage id does not. Fixed 24 bytes; shorter serials are zero-padded.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct SerialNumber(pub [u8; 24]);

impl SerialNumber {
    /// Maximum serial length in bytes
    pub const MAX_LEN: usize = 24;

    /// Create a SerialNumber from raw bytes
    pub const fn new(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    /// Create a SerialNumber from an ASCII string, zero-padded.
    ///
    /// Returns `None` if the input is empty or longer than [`Self::MAX_LEN`].
    pub fn from_ascii(s: &str) -> Option<Self> {
        if s.is_empty() || s.len() > Self::MAX_LEN || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 24];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Some(Self(bytes))
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

impl fmt::Debug for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerialNumber({})", self)
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(24);
        match std::str::from_utf8(&self.0[..end]) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{}", hex::encode(&self.0[..end])),
        }
    }
}

impl From<[u8; 24]> for SerialNumber {
    fn from(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_basics() {
        let addr = Address::new([3u8; 32]);
        assert!(!addr.is_zero());
        assert_eq!(addr.as_bytes(), &[3u8; 32]);

        let zero = Address::zero();
        assert!(zero.is_zero());
    }

    #[test]
    fn test_asset_id_ordering() {
        let a = AssetId::new(1);
        let b = AssetId::new(2);
        assert!(a < b);
        assert_eq!(a.raw(), 1);
    }

    #[test]
    fn test_serial_from_ascii() {
        let serial = SerialNumber::from_ascii("HM-000142").unwrap();
        assert_eq!(format!("{}", serial), "HM-000142");

        assert!(SerialNumber::from_ascii("").is_none());
        assert!(SerialNumber::from_ascii(&"x".repeat(25)).is_none());
    }

    #[test]
    fn test_serial_equality_is_padded() {
        let a = SerialNumber::from_ascii("AB").unwrap();
        let b = SerialNumber::from_ascii("AB").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let serial = SerialNumber::from_ascii("HM-42").unwrap();
        let json = serde_json::to_string(&serial).unwrap();
        let back: SerialNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(serial, back);
    }

    #[test]
    fn test_from_array() {
        let bytes = [5u8; 32];
        let addr: Address = bytes.into();
        assert_eq!(addr.0, bytes);
    }
}
