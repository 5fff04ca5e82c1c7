//! In-Memory Repository Implementation
//!
//! Single-process adapter for tests and local development. All session
//! mutations go through one async lock, so rotation is serialized and
//! a concurrent loser observes its token as superseded.

use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::{
    session::{RotationError, Session},
    user::RegisteredUser,
};
use crate::domain::repository::{RotationOutcome, SessionStore, UserDirectory};
use crate::domain::value_object::{
    email::Email,
    session_id::SessionId,
    tokens::{TokenDigest, TokenPair},
    user_id::UserId,
};
use crate::error::{AuthError, AuthResult};

/// In-memory auth repository
#[derive(Default)]
pub struct InMemoryAuthRepository {
    users: Mutex<HashMap<Uuid, RegisteredUser>>,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserDirectory for InMemoryAuthRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<RegisteredUser>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| &u.email == email).cloned())
    }

    async fn register(&self, user: &RegisteredUser) -> AuthResult<()> {
        let mut users = self.users.lock().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        users.insert(user.user_id.into_uuid(), user.clone());
        Ok(())
    }
}

impl SessionStore for InMemoryAuthRepository {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.session_id.into_uuid(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<Session>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(session_id.as_uuid()).cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let sessions = self.sessions.lock().await;
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.created_at);
        Ok(found)
    }

    async fn rotate(
        &self,
        session_id: &SessionId,
        presented: &TokenDigest,
        next: &TokenPair,
        refresh_expires_at_ms: i64,
    ) -> AuthResult<RotationOutcome> {
        let mut sessions = self.sessions.lock().await;

        let Some(session) = sessions.get_mut(session_id.as_uuid()) else {
            return Ok(RotationOutcome::Unknown);
        };

        match session.rotate(presented, next, refresh_expires_at_ms) {
            Ok(()) => Ok(RotationOutcome::Rotated(session.clone())),
            Err(RotationError::ReplayDetected) => Ok(RotationOutcome::Replayed(session.clone())),
            Err(RotationError::SessionRevoked) => Ok(RotationOutcome::Revoked),
            Err(RotationError::UnknownToken) => Ok(RotationOutcome::Unknown),
        }
    }

    async fn revoke(&self, session_id: &SessionId) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(session_id.as_uuid()) {
            session.revoke();
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let mut revoked = 0;
        for session in sessions.values_mut() {
            if &session.user_id == user_id && session.is_active() {
                session.revoke();
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
