//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    RefreshSessionInput, RefreshSessionUseCase, SignInInput, SignInUseCase, SignOutInput,
    SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::repository::{SessionStore, TokenIssuer, UserDirectory};
use crate::error::AuthResult;
use crate::presentation::dto::{
    AuthResponse, RefreshRequest, RefreshResponse, SignInRequest, SignOutRequest, SignUpRequest,
    UserResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<R, T>
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    pub repo: Arc<R>,
    pub issuer: Arc<T>,
    pub config: Arc<AuthConfig>,
}

// Manual Clone: the repo sits behind an Arc, so R itself does not need
// to be Clone.
impl<R, T> Clone for AuthAppState<R, T>
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            issuer: self.issuer.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signUp
pub async fn sign_up<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let input = SignUpInput {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(&output.user),
            session: output.session.into(),
        }),
    ))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signIn
pub async fn sign_in<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(&output.user),
            session: output.session.into(),
        }),
    ))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<RefreshResponse>>
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    let use_case = RefreshSessionUseCase::new(
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let input = RefreshSessionInput {
        refresh_token: req.refresh_token,
    };

    let output = use_case.execute(input).await?;

    Ok(Json(RefreshResponse {
        session: output.session.into(),
    }))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signOut
pub async fn sign_out<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Json(req): Json<SignOutRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    let use_case = SignOutUseCase::new(state.repo.clone(), state.issuer.clone());

    let input = SignOutInput {
        refresh_token: req.refresh_token,
    };

    use_case.execute(input).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/signOutAll
pub async fn sign_out_all<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Json(req): Json<SignOutRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserDirectory + SessionStore + Send + Sync + 'static,
    T: TokenIssuer + 'static,
{
    let use_case = SignOutUseCase::new(state.repo.clone(), state.issuer.clone());

    let input = SignOutInput {
        refresh_token: req.refresh_token,
    };

    use_case.execute_all(input).await?;

    Ok(StatusCode::NO_CONTENT)
}
