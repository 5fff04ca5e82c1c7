//! Sign Up Use Case
//!
//! Registers a new user and opens their first session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::IssuedSession;
use crate::domain::entity::session::Session;
use crate::domain::entity::user::{NewUser, RegisteredUser};
use crate::domain::repository::{SessionStore, TokenIssuer, UserDirectory};
use crate::domain::value_object::{
    email::Email, session_id::SessionId, user_password::RawPassword, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user: RegisteredUser,
    pub session: IssuedSession,
}

/// Sign up use case
pub struct SignUpUseCase<U, S, T>
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

impl<U, S, T> SignUpUseCase<U, S, T>
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

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(input.email).map_err(AuthError::from)?;

        // A taken address conflicts before any other input is judged.
        // The directory's unique constraint is the real guard against
        // races.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let password = RawPassword::new(input.password)
            .map_err(|e| AuthError::WeakPassword(e.message().to_string()))?;
        let new_user = NewUser::new(input.first_name, input.last_name, email, password)
            .map_err(AuthError::from)?;

        let hashed =
            UserPassword::from_raw(&new_user.password, self.config.pepper()).map_err(AuthError::from)?;
        let user = RegisteredUser::new(new_user, hashed);

        self.users.register(&user).await?;

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
            "User signed up"
        );

        Ok(SignUpOutput {
            user,
            session: issued,
        })
    }
}

/// Open a brand-new session for a user
///
/// Shared by sign-up and sign-in: issues the generation-0 pair and
/// persists the session with a single-entry token family.
pub(crate) async fn open_session<S, T>(
    sessions: &S,
    issuer: &T,
    config: &AuthConfig,
    user: &RegisteredUser,
) -> AuthResult<IssuedSession>
where
    S: SessionStore,
    T: TokenIssuer,
{
    let session_id = SessionId::new();
    let tokens = issuer.issue(&user.user_id, &session_id, 0)?;

    let now_ms = chrono::Utc::now().timestamp_millis();
    let access_expires_at_ms = now_ms + config.access_token_ttl_ms();
    let refresh_expires_at_ms = now_ms + config.refresh_token_ttl_ms();

    let session = Session::new(session_id, user.user_id, &tokens, refresh_expires_at_ms);
    sessions.create(&session).await?;

    Ok(IssuedSession {
        session_id,
        tokens,
        access_expires_at_ms,
        refresh_expires_at_ms,
    })
}
