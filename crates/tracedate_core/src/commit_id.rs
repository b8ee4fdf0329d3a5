//! Commit identification.

use crate::error::{Result, TraceError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte git object id naming a commit.
///
/// Stored in binary form; the 40 character lowercase hex form is only used
/// at the boundaries (git output, CLI, logs).
///
/// # Examples
///
/// ```
/// use tracedate_core::CommitId;
///
/// let id = CommitId::from_bytes([0xab; 20]);
/// assert_eq!(id.as_hex().len(), 40);
/// assert_eq!(id.short(), "abababab");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommitId([u8; 20]);

impl CommitId {
    /// The length of a CommitId in bytes.
    pub const LEN: usize = 20;

    /// The length of a CommitId as a hex string.
    pub const HEX_LEN: usize = 40;

    /// Creates a CommitId from raw bytes.
    #[inline]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns this CommitId as a lowercase hex string.
    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form used in log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parses a CommitId from a hex string.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::InvalidHex` if the string is not valid hex
    /// or is not exactly 40 characters long.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracedate_core::CommitId;
    ///
    /// let hex = "044b0824e68c4dacdaf26ff52a741ca1b5118c9b";
    /// let id = CommitId::from_hex(hex).unwrap();
    /// assert_eq!(id.as_hex(), hex);
    /// ```
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != Self::HEX_LEN {
            return Err(TraceError::InvalidHex(format!(
                "expected {} hex chars, got {}",
                Self::HEX_LEN,
                s.len()
            )));
        }

        let bytes = hex::decode(s).map_err(|e| TraceError::InvalidHex(e.to_string()))?;

        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| TraceError::InvalidHex("invalid length".to_string()))?;

        Ok(Self(arr))
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({}...)", &self.as_hex()[..12])
    }
}
