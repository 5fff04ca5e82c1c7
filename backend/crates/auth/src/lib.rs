//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, port traits
//! - `application/` - Use cases and application configuration
//! - `infra/` - Database / token implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - User signup/signin with email + password
//! - Access/refresh token pairs per session
//! - Token-family tracking with refresh rotation
//! - Refresh-token reuse (replay) detection with session revocation
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, verified in constant time
//! - Tokens HMAC-SHA256 signed, bound to user, session, and generation
//! - Only token digests are persisted, never raw refresh tokens
//! - Replaying a superseded refresh token revokes the whole session

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::memory::InMemoryAuthRepository;
pub use infra::postgres::PgAuthRepository;
pub use infra::token::HmacTokenIssuer;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
