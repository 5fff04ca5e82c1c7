//! Application Layer
//!
//! Use cases orchestrating domain entities and repository traits.

pub mod config;
pub mod refresh_session;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

pub use config::AuthConfig;
pub use refresh_session::{RefreshSessionInput, RefreshSessionOutput, RefreshSessionUseCase};
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_out::{SignOutInput, SignOutUseCase};
pub use sign_up::{SignUpInput, SignUpUseCase};

use crate::domain::value_object::{
    session_id::SessionId,
    tokens::TokenPair,
};

/// Session material returned by sign-up, sign-in and refresh
///
/// Raw tokens appear here exactly once, on the way to the client.
#[derive(Debug)]
pub struct IssuedSession {
    pub session_id: SessionId,
    pub tokens: TokenPair,
    /// Access token expiry (Unix timestamp ms)
    pub access_expires_at_ms: i64,
    /// Refresh token expiry (Unix timestamp ms)
    pub refresh_expires_at_ms: i64,
}
