//! Auth Router

use axum::{Router, routing::post};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{SessionStore, TokenIssuer, UserDirectory};
use crate::infra::postgres::PgAuthRepository;
use crate::infra::token::HmacTokenIssuer;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the auth router with the PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    let issuer = HmacTokenIssuer::new(&config);
    auth_router_generic(repo, issuer, config)
}

/// Create an auth router for any repository and issuer implementation
pub fn auth_router_generic<R, T>(repo: R, issuer: T, config: AuthConfig) -> Router
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        issuer: Arc::new(issuer),
        config: Arc::new(config),
    };

    Router::new()
        .route("/signUp", post(handlers::sign_up::<R, T>))
        .route("/signIn", post(handlers::sign_in::<R, T>))
        .route("/refresh", post(handlers::refresh::<R, T>))
        .route("/signOut", post(handlers::sign_out::<R, T>))
        .route("/signOutAll", post(handlers::sign_out_all::<R, T>))
        .with_state(state)
}
