//! Sign In Use Case
//!
//! Authenticates a user and opens an independent session.
//!
//! Unknown email and wrong password both fail with
//! `InvalidCredentials`; the two paths are indistinguishable to the
//! caller.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::sign_up::open_session;
use crate::application::IssuedSession;
use crate::domain::entity::user::RegisteredUser;
use crate::domain::repository::{SessionStore, TokenIssuer, UserDirectory};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user: RegisteredUser,
    pub session: IssuedSession,
}

/// Sign in use case
pub struct SignInUseCase<U, S, T>
where
    U: UserDirectory,
    S: SessionStore,
    T: TokenIssuer,
{
    users: Arc<U>,
    sessions: Arc<S>,
    issuer: Arc<T>,
    config: Arc<AuthConfig>,
}

impl<U, S, T> SignInUseCase<U, S, T>
where
    U: UserDirectory,
    S: SessionStore,
    T: TokenIssuer,
{
    pub fn new(users: Arc<U>, sessions: Arc<S>, issuer: Arc<T>, config: Arc<AuthConfig>) -> Self {
        Self {
            users,
            sessions,
            issuer,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        // Any input defect collapses into the same credential error
        let email = Email::new(input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let password = RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.password.verify(&password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        // Each sign-in opens its own session with its own token family
        let issued = open_session(
            self.sessions.as_ref(),
            self.issuer.as_ref(),
            &self.config,
            &user,
        )
        .await?;

        tracing::info!(
            public_id = %user.public_id,
            session_id = %issued.session_id,
            "User signed in"
        );

        Ok(SignInOutput {
            user,
            session: issued,
        })
    }
}
