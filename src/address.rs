//! Contract address identifiers.
//!
//! Every entity in the data model is keyed by the address of the contract it
//! mirrors, rendered as a `0x`-prefixed lowercase hex string of fixed length.
//! [`Address`] is the typed form of that identifier.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Length of an address in bytes.
const ADDRESS_LEN: usize = 20;

/// A 20-byte contract address.
///
/// Displays as `0x` followed by 40 lowercase hex characters, which is also
/// the canonical entity-store key format. Parsing accepts mixed case but the
/// rendered form is always lowercase, so two spellings of the same address
/// never produce distinct store keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

/// Error returned when parsing an address from its hex string form fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// The input did not have the expected `0x` + 40 hex character shape.
    #[error("expected 42-character 0x-prefixed address, got {length} characters")]
    InvalidLength {
        /// Number of characters in the rejected input.
        length: usize,
    },
    /// The input contained a character outside `[0-9a-fA-F]`.
    #[error("invalid hex character `{character}` at offset {offset}")]
    InvalidCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the character within the input.
        offset: usize,
    },
}

impl Address {
    /// Construct an address from its raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw 20 bytes of the address.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

fn hex_value(byte: u8, offset: usize) -> Result<u8, AddressParseError> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err(AddressParseError::InvalidCharacter {
            character: char::from(byte),
            offset,
        }),
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .ok_or(AddressParseError::InvalidLength { length: s.len() })?;
        if hex.len() != ADDRESS_LEN * 2 {
            return Err(AddressParseError::InvalidLength { length: s.len() });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        for (index, byte) in bytes.iter_mut().enumerate() {
            let high = hex.as_bytes()[index * 2];
            let low = hex.as_bytes()[index * 2 + 1];
            *byte = (hex_value(high, index * 2 + 2)? << 4) | hex_value(low, index * 2 + 3)?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'_, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
