//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::IssuedSession;
use crate::domain::entity::user::RegisteredUser;

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

// ============================================================================
// Refresh / Sign Out
// ============================================================================

/// Refresh request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Sign out request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutRequest {
    pub refresh_token: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Public user representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Public nanoid, never the internal UUID
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at_ms: i64,
}

impl From<&RegisteredUser> for UserResponse {
    fn from(user: &RegisteredUser) -> Self {
        Self {
            id: user.public_id.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.to_string(),
            created_at_ms: user.created_at.timestamp_millis(),
        }
    }
}

/// Issued session tokens
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at_ms: i64,
    pub refresh_expires_at_ms: i64,
}

impl From<IssuedSession> for SessionResponse {
    fn from(issued: IssuedSession) -> Self {
        Self {
            id: issued.session_id.to_string(),
            access_token: issued.tokens.access_token.into_string(),
            refresh_token: issued.tokens.refresh_token.into_string(),
            access_expires_at_ms: issued.access_expires_at_ms,
            refresh_expires_at_ms: issued.refresh_expires_at_ms,
        }
    }
}

/// Sign up / sign in response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub session: SessionResponse,
}

/// Refresh response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub session: SessionResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{
        session_id::SessionId,
        tokens::{AccessToken, RefreshToken, TokenPair},
    };

    #[test]
    fn test_session_response_exposes_session_id() {
        let session_id = SessionId::new();
        let issued = IssuedSession {
            session_id,
            tokens: TokenPair::new(AccessToken::new("at.x"), RefreshToken::new("rt.x")),
            access_expires_at_ms: 1,
            refresh_expires_at_ms: 2,
        };

        let response = SessionResponse::from(issued);
        assert_eq!(response.id, session_id.to_string());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], session_id.to_string());
        assert_eq!(json["accessToken"], "at.x");
        assert_eq!(json["refreshToken"], "rt.x");
    }
}
