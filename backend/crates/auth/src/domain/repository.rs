//! Repository and Issuer Traits
//!
//! Interfaces for persistence and token signing. Implementations live
//! in the infrastructure layer.

use crate::domain::entity::{session::Session, user::RegisteredUser};
use crate::domain::value_object::{
    email::Email,
    session_id::SessionId,
    tokens::{AccessToken, RefreshToken, TokenDigest, TokenPair},
    user_id::UserId,
};
use crate::error::AuthResult;

/// User directory trait
#[trait_variant::make(UserDirectory: Send)]
pub trait LocalUserDirectory {
    /// Find a user by email (case-sensitive match)
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<RegisteredUser>>;

    /// Persist a new user
    ///
    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn register(&self, user: &RegisteredUser) -> AuthResult<()>;
}

/// Outcome of a rotation attempt against the store
#[derive(Debug)]
pub enum RotationOutcome {
    /// Family head matched; the rotated session is returned
    Rotated(Session),
    /// Superseded token presented. The store has already revoked the
    /// session; the revoked session is returned for logging.
    Replayed(Session),
    /// Session revoked before this attempt
    Revoked,
    /// Token matched nothing, or the session does not exist
    Unknown,
}

/// Session store trait
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Persist a freshly created session with its generation-0 record
    async fn create(&self, session: &Session) -> AuthResult<()>;

    /// Load a session with its full token family
    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<Session>>;

    /// All sessions belonging to a user, oldest first
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<Session>>;

    /// Atomically rotate a session
    ///
    /// Appends a record for `next` and advances the head only if
    /// `presented` is the current head refresh digest. Concurrent
    /// rotations of the same head resolve so that exactly one wins;
    /// the loser observes its token as superseded, which is the
    /// replay path.
    async fn rotate(
        &self,
        session_id: &SessionId,
        presented: &TokenDigest,
        next: &TokenPair,
        refresh_expires_at_ms: i64,
    ) -> AuthResult<RotationOutcome>;

    /// Revoke a single session. Idempotent.
    async fn revoke(&self, session_id: &SessionId) -> AuthResult<()>;

    /// Revoke every active session of a user, returning the count
    async fn revoke_all_for_user(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Remove sessions whose head refresh token has expired
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}

/// Verified claims carried by a signed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub generation: u32,
    /// Expiry (Unix timestamp ms)
    pub expires_at_ms: i64,
}

/// Token issuer trait
///
/// Signing is pure computation, so this stays synchronous.
pub trait TokenIssuer: Send + Sync {
    /// Issue an access/refresh pair bound to a session generation
    fn issue(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        generation: u32,
    ) -> AuthResult<TokenPair>;

    /// Verify an access token's signature and expiry
    fn verify_access(&self, token: &AccessToken) -> AuthResult<TokenClaims>;

    /// Verify a refresh token's signature and expiry
    fn verify_refresh(&self, token: &RefreshToken) -> AuthResult<TokenClaims>;
}
