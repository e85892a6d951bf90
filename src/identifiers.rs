//! Type-safe identifiers.
//!
//! Chrome derives extension ids from the publisher key: 32 characters drawn
//! from `a` through `p`. [`ExtensionId`] only holds strings of that shape.
//!
//! # Example
//!
//! ```
//! use chrome_extension::ExtensionId;
//!
//! let id = ExtensionId::parse("cjpalhdlnbpafiamejdnhcphjbkeiagm").unwrap();
//! assert_eq!(id.as_str(), "cjpalhdlnbpafiamejdnhcphjbkeiagm");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Length of every Chrome extension id.
pub const EXTENSION_ID_LEN: usize = 32;

// ============================================================================
// ExtensionId
// ============================================================================

/// Chrome Web Store extension identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Validates and wraps an extension id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtensionId`] unless `id` is exactly 32
    /// characters in `a`..=`p`.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if is_valid_extension_id(&id) {
            Ok(Self(id))
        } else {
            Err(Error::invalid_extension_id(id))
        }
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `id` has the shape of a Chrome extension id.
#[must_use]
pub fn is_valid_extension_id(id: &str) -> bool {
    id.len() == EXTENSION_ID_LEN && id.bytes().all(|b| (b'a'..=b'p').contains(&b))
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtensionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExtensionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ExtensionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for ExtensionId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ExtensionId> for String {
    fn from(id: ExtensionId) -> Self {
        id.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const VALID: &str = "cjpalhdlnbpafiamejdnhcphjbkeiagm";

    #[test]
    fn test_parse_valid() {
        let id = ExtensionId::parse(VALID).expect("valid id");
        assert_eq!(id.as_str(), VALID);
        assert_eq!(id.to_string(), VALID);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(ExtensionId::parse("cjpalhdlnbpafiam").is_err());
        assert!(ExtensionId::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_alphabet() {
        // 'z' and uppercase never appear in Chrome ids
        assert!(ExtensionId::parse("zjpalhdlnbpafiamejdnhcphjbkeiagm").is_err());
        assert!(ExtensionId::parse("CJPALHDLNBPAFIAMEJDNHCPHJBKEIAGM").is_err());
    }

    #[test]
    fn test_from_str() {
        let id: ExtensionId = VALID.parse().expect("valid id");
        assert_eq!(id.as_ref(), VALID);
    }

    #[test]
    fn test_serde_roundtrip_rejects_invalid() {
        let json = serde_json::to_string(&ExtensionId::parse(VALID).unwrap()).unwrap();
        assert_eq!(json, format!("\"{VALID}\""));
        assert!(serde_json::from_str::<ExtensionId>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_alphabet_ids_accepted(id in "[a-p]{32}") {
            prop_assert!(ExtensionId::parse(id).is_ok());
        }

        #[test]
        fn prop_other_lengths_rejected(id in "[a-p]{0,31}|[a-p]{33,40}") {
            prop_assert!(ExtensionId::parse(id).is_err());
        }
    }
}
