//! HMAC Token Issuer
//!
//! Signs opaque session tokens with HMAC-SHA256.
//!
//! Wire format:
//!
//! ```text
//! {kind}.{user_id}.{session_id}.{generation}.{expires_at_ms}.{sig}
//! ```
//!
//! where `kind` is `at` (access) or `rt` (refresh) and `sig` is the
//! URL-safe base64 (no padding) HMAC of everything before it. The kind
//! participates in the signed payload, so an access token can never
//! verify as a refresh token.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use platform::crypto::{constant_time_eq, from_base64_url, to_base64_url};

use crate::application::config::AuthConfig;
use crate::domain::repository::{TokenClaims, TokenIssuer};
use crate::domain::value_object::{
    session_id::SessionId,
    tokens::{AccessToken, RefreshToken, TokenPair},
    user_id::UserId,
};
use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

const ACCESS_KIND: &str = "at";
const REFRESH_KIND: &str = "rt";

/// HMAC-SHA256 token issuer
#[derive(Clone)]
pub struct HmacTokenIssuer {
    secret: [u8; 32],
    access_ttl_ms: i64,
    refresh_ttl_ms: i64,
}

impl HmacTokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.token_secret,
            access_ttl_ms: config.access_token_ttl_ms(),
            refresh_ttl_ms: config.refresh_token_ttl_ms(),
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        to_base64_url(&mac.finalize().into_bytes())
    }

    fn make_token(
        &self,
        kind: &str,
        user_id: &UserId,
        session_id: &SessionId,
        generation: u32,
        expires_at_ms: i64,
    ) -> String {
        let payload = format!(
            "{}.{}.{}.{}.{}",
            kind, user_id, session_id, generation, expires_at_ms
        );
        let sig = self.sign(&payload);
        format!("{}.{}", payload, sig)
    }

    fn verify(&self, kind: &str, token: &str) -> Option<TokenClaims> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 6 || parts[0] != kind {
            return None;
        }

        let payload_len = token.len() - parts[5].len() - 1;
        let payload = &token[..payload_len];

        let expected = self.sign(payload);
        let presented_sig = from_base64_url(parts[5]).ok()?;
        let expected_sig = from_base64_url(&expected).ok()?;
        if !constant_time_eq(&presented_sig, &expected_sig) {
            return None;
        }

        let user_id = UserId::from_uuid(Uuid::from_str(parts[1]).ok()?);
        let session_id = SessionId::from_uuid(Uuid::from_str(parts[2]).ok()?);
        let generation: u32 = parts[3].parse().ok()?;
        let expires_at_ms: i64 = parts[4].parse().ok()?;

        if chrono::Utc::now().timestamp_millis() > expires_at_ms {
            return None;
        }

        Some(TokenClaims {
            user_id,
            session_id,
            generation,
            expires_at_ms,
        })
    }
}

impl TokenIssuer for HmacTokenIssuer {
    fn issue(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        generation: u32,
    ) -> AuthResult<TokenPair> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        let access = self.make_token(
            ACCESS_KIND,
            user_id,
            session_id,
            generation,
            now_ms + self.access_ttl_ms,
        );
        let refresh = self.make_token(
            REFRESH_KIND,
            user_id,
            session_id,
            generation,
            now_ms + self.refresh_ttl_ms,
        );

        Ok(TokenPair::new(
            AccessToken::new(access),
            RefreshToken::new(refresh),
        ))
    }

    fn verify_access(&self, token: &AccessToken) -> AuthResult<TokenClaims> {
        self.verify(ACCESS_KIND, token.as_str())
            .ok_or(AuthError::InvalidAccessToken)
    }

    fn verify_refresh(&self, token: &RefreshToken) -> AuthResult<TokenClaims> {
        self.verify(REFRESH_KIND, token.as_str())
            .ok_or(AuthError::InvalidRefreshToken)
    }
}
