//! Session Token Value Objects
//!
//! Opaque wrappers around the signed token strings handed to clients.
//!
//! Access and refresh tokens are distinct types so a refresh token can
//! never be passed where an access token is expected. Equality on both
//! is constant-time. Only the SHA-256 digest of a token is ever
//! persisted; the raw string exists in memory long enough to be
//! returned to the caller.

use platform::crypto::{constant_time_eq, sha256};
use std::fmt;

// ============================================================================
// Access Token
// ============================================================================

/// Short-lived token presented as a Bearer credential
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// SHA-256 digest for persistence and audit
    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(&self.0)
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for AccessToken {}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Refresh Token
// ============================================================================

/// Long-lived token used to obtain a fresh token pair
#[derive(Clone)]
pub struct RefreshToken(String);

impl RefreshToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// SHA-256 digest for persistence and matching against the family
    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(&self.0)
    }
}

impl PartialEq for RefreshToken {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for RefreshToken {}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Token Pair
// ============================================================================

/// Access/refresh pair issued together for one session generation
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl TokenPair {
    pub fn new(access_token: AccessToken, refresh_token: RefreshToken) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }
}

// ============================================================================
// Token Digest
// ============================================================================

/// SHA-256 digest of a token string
///
/// This is what lands in storage. Comparing a presented refresh token
/// against the session's token family goes through digests, so the raw
/// token never needs to be kept server-side.
#[derive(Clone, Copy)]
pub struct TokenDigest([u8; 32]);

impl TokenDigest {
    /// Digest of a raw token string
    pub fn of(token: &str) -> Self {
        Self(sha256(token.as_bytes()))
    }

    /// Reconstruct from stored bytes
    ///
    /// ## Errors
    /// Returns the input back if it is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, usize> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| bytes.len())?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl PartialEq for TokenDigest {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for TokenDigest {}

impl fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 4 bytes are enough to correlate log lines
        write!(
            f,
            "TokenDigest({:02x}{:02x}{:02x}{:02x}..)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}
