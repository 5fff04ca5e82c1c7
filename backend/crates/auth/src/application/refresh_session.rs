//! Refresh Session Use Case
//!
//! Exchanges a refresh token for the next token pair, rotating the
//! session's token family. A superseded token revokes the session and
//! is reported as an invalid token, same as malformed or expired ones.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::IssuedSession;
use crate::domain::repository::{RotationOutcome, SessionStore, TokenIssuer};
use crate::domain::value_object::tokens::RefreshToken;
use crate::error::{AuthError, AuthResult};

/// Refresh input
pub struct RefreshSessionInput {
    pub refresh_token: String,
}

/// Refresh output
#[derive(Debug)]
pub struct RefreshSessionOutput {
    pub session: IssuedSession,
}

/// Refresh session use case
pub struct RefreshSessionUseCase<S, T>
where
    S: SessionStore,
    T: TokenIssuer,
{
    sessions: Arc<S>,
    issuer: Arc<T>,
    config: Arc<AuthConfig>,
}

impl<S, T> RefreshSessionUseCase<S, T>
where
    S: SessionStore,
    T: TokenIssuer,
{
    pub fn new(sessions: Arc<S>, issuer: Arc<T>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions,
            issuer,
            config,
        }
    }

    pub async fn execute(&self, input: RefreshSessionInput) -> AuthResult<RefreshSessionOutput> {
        let presented = RefreshToken::new(input.refresh_token);

        // Signature and expiry check before touching storage
        let claims = self
            .issuer
            .verify_refresh(&presented)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        // Issue the candidate pair for the next generation. It is only
        // handed out if the store accepts the rotation.
        let next = self
            .issuer
            .issue(&claims.user_id, &claims.session_id, claims.generation + 1)?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        let access_expires_at_ms = now_ms + self.config.access_token_ttl_ms();
        let refresh_expires_at_ms = now_ms + self.config.refresh_token_ttl_ms();

        let outcome = self
            .sessions
            .rotate(
                &claims.session_id,
                &presented.digest(),
                &next,
                refresh_expires_at_ms,
            )
            .await?;

        match outcome {
            RotationOutcome::Rotated(session) => {
                tracing::info!(
                    session_id = %session.session_id,
                    generation = session.generation(),
                    "Session rotated"
                );

                Ok(RefreshSessionOutput {
                    session: IssuedSession {
                        session_id: session.session_id,
                        tokens: next,
                        access_expires_at_ms,
                        refresh_expires_at_ms: session.refresh_expires_at_ms,
                    },
                })
            }
            RotationOutcome::Replayed(session) => {
                tracing::warn!(
                    session_id = %session.session_id,
                    user_id = %session.user_id,
                    "Superseded refresh token presented, session revoked"
                );
                Err(AuthError::InvalidRefreshToken)
            }
            RotationOutcome::Revoked | RotationOutcome::Unknown => {
                Err(AuthError::InvalidRefreshToken)
            }
        }
    }
}
