//! Auth Middleware
//!
//! Middleware for requiring a valid access token on protected routes.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::domain::repository::TokenIssuer;
use crate::domain::value_object::{session_id::SessionId, tokens::AccessToken, user_id::UserId};

/// Middleware state
pub struct AuthMiddlewareState<T>
where
    T: TokenIssuer + 'static,
{
    pub issuer: Arc<T>,
}

impl<T> Clone for AuthMiddlewareState<T>
where
    T: TokenIssuer + 'static,
{
    fn clone(&self) -> Self {
        Self {
            issuer: self.issuer.clone(),
        }
    }
}

/// Identity of the caller, stored in request extensions
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// Middleware that requires a valid Bearer access token
pub async fn require_bearer_auth<T>(
    state: AuthMiddlewareState<T>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    T: TokenIssuer + 'static,
{
    let unauthorized =
        || (StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response();

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let claims = state
        .issuer
        .verify_access(&AccessToken::new(token))
        .map_err(|_| unauthorized())?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.user_id,
        session_id: claims.session_id,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::domain::value_object::{session_id::SessionId, user_id::UserId};
    use crate::infra::token::HmacTokenIssuer;
    use axum::{Extension, Router, middleware, routing::get};
    use tower::ServiceExt;

    fn protected_app(issuer: Arc<HmacTokenIssuer>) -> Router {
        let state = AuthMiddlewareState { issuer };
        Router::new()
            .route(
                "/whoami",
                get(|Extension(user): Extension<AuthenticatedUser>| async move {
                    user.user_id.to_string()
                }),
            )
            .layer(middleware::from_fn(move |req, next| {
                require_bearer_auth(state.clone(), req, next)
            }))
    }

    fn request(auth_header: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_or_garbage_token_is_unauthorized() {
        let config = AuthConfig::with_random_secret();
        let app = protected_app(Arc::new(HmacTokenIssuer::new(&config)));

        let response = app.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("X-Auth-Required").unwrap(), "true");

        let response = app
            .oneshot(request(Some("Bearer garbage".to_string())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_access_token_reaches_the_handler() {
        let config = AuthConfig::with_random_secret();
        let issuer = Arc::new(HmacTokenIssuer::new(&config));

        let user_id = UserId::new();
        let pair = issuer.issue(&user_id, &SessionId::new(), 0).unwrap();

        let response = protected_app(issuer)
            .oneshot(request(Some(format!(
                "Bearer {}",
                pair.access_token.as_str()
            ))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn refresh_token_is_not_accepted_as_bearer() {
        let config = AuthConfig::with_random_secret();
        let issuer = Arc::new(HmacTokenIssuer::new(&config));

        let pair = issuer.issue(&UserId::new(), &SessionId::new(), 0).unwrap();

        let response = protected_app(issuer)
            .oneshot(request(Some(format!(
                "Bearer {}",
                pair.refresh_token.as_str()
            ))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
