//! Application Configuration
//!
//! Configuration for the auth application layer. Passed explicitly to
//! use cases and the token issuer, never held in a global.

use std::time::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC token signing (32 bytes)
    pub token_secret: [u8; 32],
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (30 days)
    pub refresh_token_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Alias kept for symmetry with the api binary's env loading
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    /// Access token TTL in milliseconds
    pub fn access_token_ttl_ms(&self) -> i64 {
        self.access_token_ttl.as_millis() as i64
    }

    /// Refresh token TTL in milliseconds
    pub fn refresh_token_ttl_ms(&self) -> i64 {
        self.refresh_token_ttl.as_millis() as i64
    }

    /// Password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_secret_is_fresh_per_config() {
        let a = AuthConfig::with_random_secret();
        let b = AuthConfig::with_random_secret();
        assert_ne!(a.token_secret, [0u8; 32]);
        assert_ne!(a.token_secret, b.token_secret);
    }
}
