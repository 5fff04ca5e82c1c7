//! Sign Out Use Case
//!
//! Revokes the session identified by a refresh token. Idempotent: a
//! token for an already revoked or unknown session still succeeds.

use std::sync::Arc;

use crate::domain::repository::{SessionStore, TokenIssuer};
use crate::domain::value_object::tokens::RefreshToken;
use crate::error::AuthResult;

/// Sign out input
pub struct SignOutInput {
    pub refresh_token: String,
}

/// Sign out use case
pub struct SignOutUseCase<S, T>
where
    S: SessionStore,
    T: TokenIssuer,
{
    sessions: Arc<S>,
    issuer: Arc<T>,
}

impl<S, T> SignOutUseCase<S, T>
where
    S: SessionStore,
    T: TokenIssuer,
{
    pub fn new(sessions: Arc<S>, issuer: Arc<T>) -> Self {
        Self { sessions, issuer }
    }

    pub async fn execute(&self, input: SignOutInput) -> AuthResult<()> {
        let presented = RefreshToken::new(input.refresh_token);

        // A token that does not verify cannot name a session to revoke.
        // Nothing to do, and nothing to tell the caller.
        let Ok(claims) = self.issuer.verify_refresh(&presented) else {
            return Ok(());
        };

        self.sessions.revoke(&claims.session_id).await?;

        tracing::info!(session_id = %claims.session_id, "User signed out");

        Ok(())
    }

    /// Revoke every session belonging to the token's user
    ///
    /// Same idempotent contract as `execute`, but scoped to the whole
    /// account instead of the single session named by the token.
    pub async fn execute_all(&self, input: SignOutInput) -> AuthResult<()> {
        let presented = RefreshToken::new(input.refresh_token);

        let Ok(claims) = self.issuer.verify_refresh(&presented) else {
            return Ok(());
        };

        let revoked = self.sessions.revoke_all_for_user(&claims.user_id).await?;

        tracing::info!(
            user_id = %claims.user_id,
            sessions_revoked = revoked,
            "User signed out everywhere"
        );

        Ok(())
    }
}
