//! Session Entity
//!
//! An authenticated session with its token family.
//!
//! Every refresh rotation appends a [`TokenRecord`] to the family and
//! bumps the generation. Only the newest record (the head) is a valid
//! refresh credential. Presenting a superseded token means it leaked
//! or the client replayed it, and the whole session is revoked.
//!
//! State machine: `Active` sessions can rotate or be revoked.
//! `Revoked` is terminal.

use chrono::{DateTime, Utc};
use derive_more::Display;

use crate::domain::value_object::{
    session_id::SessionId,
    tokens::{TokenDigest, TokenPair},
    user_id::UserId,
};

/// Session lifecycle state
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    #[display("active")]
    Active,
    #[display("revoked")]
    Revoked,
}

impl SessionState {
    /// Encode for storage
    pub fn as_i16(&self) -> i16 {
        match self {
            SessionState::Active => 0,
            SessionState::Revoked => 1,
        }
    }

    /// Decode from storage
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(SessionState::Active),
            1 => Some(SessionState::Revoked),
            _ => None,
        }
    }
}

/// One generation of issued tokens
///
/// Only digests are kept. The raw tokens go to the client and are
/// never stored server-side.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    /// Position within the family, 0 for the sign-in pair
    pub generation: u32,
    pub access_digest: TokenDigest,
    pub refresh_digest: TokenDigest,
    pub issued_at: DateTime<Utc>,
}

/// Where a presented refresh token sits in the family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMatch {
    /// Matches the newest record, rotation may proceed
    Head,
    /// Matches an older record, replay
    Superseded,
    /// Matches nothing in this family
    Unknown,
}

/// Why a rotation attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationError {
    /// Session was already revoked
    SessionRevoked,
    /// A superseded token was presented; the session is now revoked
    ReplayDetected,
    /// Token does not belong to this family
    UnknownToken,
}

/// Authenticated session entity
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub state: SessionState,
    /// Append-only record of every token pair issued for this session
    token_family: Vec<TokenRecord>,
    /// Expiry of the head refresh token (Unix timestamp ms)
    pub refresh_expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new active session from the sign-in token pair
    ///
    /// Expiry comes from the application layer (config), not hard-coded
    /// here.
    pub fn new(
        session_id: SessionId,
        user_id: UserId,
        pair: &TokenPair,
        refresh_expires_at_ms: i64,
    ) -> Self {
        let now = Utc::now();

        Self {
            session_id,
            user_id,
            state: SessionState::Active,
            token_family: vec![TokenRecord {
                generation: 0,
                access_digest: pair.access_token.digest(),
                refresh_digest: pair.refresh_token.digest(),
                issued_at: now,
            }],
            refresh_expires_at_ms,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstruct from storage
    ///
    /// The family must be non-empty and ordered by generation; storage
    /// layers guarantee this via their queries.
    pub fn from_storage(
        session_id: SessionId,
        user_id: UserId,
        state: SessionState,
        token_family: Vec<TokenRecord>,
        refresh_expires_at_ms: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            user_id,
            state,
            token_family,
            refresh_expires_at_ms,
            created_at,
            updated_at,
        }
    }

    /// Current generation number (head of the family)
    pub fn generation(&self) -> u32 {
        self.token_family.last().map(|r| r.generation).unwrap_or(0)
    }

    /// Head token record
    pub fn current(&self) -> Option<&TokenRecord> {
        self.token_family.last()
    }

    /// Full token family, oldest first
    pub fn token_family(&self) -> &[TokenRecord] {
        &self.token_family
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Check if the head refresh token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.refresh_expires_at_ms
    }

    /// Locate a presented refresh token within the family
    pub fn match_refresh(&self, presented: &TokenDigest) -> RefreshMatch {
        let head_generation = self.generation();

        for record in self.token_family.iter().rev() {
            if record.refresh_digest == *presented {
                return if record.generation == head_generation {
                    RefreshMatch::Head
                } else {
                    RefreshMatch::Superseded
                };
            }
        }

        RefreshMatch::Unknown
    }

    /// Rotate the session with a freshly issued pair
    ///
    /// The presented token must be the family head. A superseded token
    /// revokes the session before returning `ReplayDetected`; callers
    /// must persist that revocation.
    pub fn rotate(
        &mut self,
        presented: &TokenDigest,
        next: &TokenPair,
        refresh_expires_at_ms: i64,
    ) -> Result<(), RotationError> {
        if !self.is_active() {
            return Err(RotationError::SessionRevoked);
        }

        match self.match_refresh(presented) {
            RefreshMatch::Head => {
                let now = Utc::now();
                self.token_family.push(TokenRecord {
                    generation: self.generation() + 1,
                    access_digest: next.access_token.digest(),
                    refresh_digest: next.refresh_token.digest(),
                    issued_at: now,
                });
                self.refresh_expires_at_ms = refresh_expires_at_ms;
                self.updated_at = now;
                Ok(())
            }
            RefreshMatch::Superseded => {
                self.revoke();
                Err(RotationError::ReplayDetected)
            }
            RefreshMatch::Unknown => Err(RotationError::UnknownToken),
        }
    }

    /// Revoke the session. Idempotent, `Revoked` is terminal.
    pub fn revoke(&mut self) {
        self.state = SessionState::Revoked;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::tokens::{AccessToken, RefreshToken};

    fn pair(tag: &str) -> TokenPair {
        TokenPair::new(
            AccessToken::new(format!("at.{}", tag)),
            RefreshToken::new(format!("rt.{}", tag)),
        )
    }

    fn expiry_ms() -> i64 {
        (Utc::now() + chrono::Duration::days(30)).timestamp_millis()
    }

    fn fresh_session(pair: &TokenPair) -> Session {
        Session::new(SessionId::new(), UserId::new(), pair, expiry_ms())
    }

    #[test]
    fn test_new_session_has_single_family_entry() {
        let p0 = pair("g0");
        let session = fresh_session(&p0);

        assert!(session.is_active());
        assert_eq!(session.token_family().len(), 1);
        assert_eq!(session.generation(), 0);
        assert_eq!(
            session.current().unwrap().refresh_digest,
            p0.refresh_token.digest()
        );
    }

    #[test]
    fn test_rotation_appends_and_bumps_generation() {
        let p0 = pair("g0");
        let p1 = pair("g1");
        let mut session = fresh_session(&p0);

        session
            .rotate(&p0.refresh_token.digest(), &p1, expiry_ms())
            .unwrap();

        assert_eq!(session.generation(), 1);
        assert_eq!(session.token_family().len(), 2);
        assert_eq!(
            session.match_refresh(&p1.refresh_token.digest()),
            RefreshMatch::Head
        );
        assert_eq!(
            session.match_refresh(&p0.refresh_token.digest()),
            RefreshMatch::Superseded
        );
    }

    #[test]
    fn test_replay_revokes_session() {
        let p0 = pair("g0");
        let p1 = pair("g1");
        let p2 = pair("g2");
        let mut session = fresh_session(&p0);

        session
            .rotate(&p0.refresh_token.digest(), &p1, expiry_ms())
            .unwrap();

        // Replaying the superseded sign-in token kills the session
        let err = session
            .rotate(&p0.refresh_token.digest(), &p2, expiry_ms())
            .unwrap_err();
        assert_eq!(err, RotationError::ReplayDetected);
        assert!(!session.is_active());

        // And the legitimate head no longer works either
        let err = session
            .rotate(&p1.refresh_token.digest(), &p2, expiry_ms())
            .unwrap_err();
        assert_eq!(err, RotationError::SessionRevoked);
    }

    #[test]
    fn test_unknown_token_does_not_revoke() {
        let p0 = pair("g0");
        let mut session = fresh_session(&p0);

        let foreign = pair("other");
        let err = session
            .rotate(&foreign.refresh_token.digest(), &pair("g1"), expiry_ms())
            .unwrap_err();

        assert_eq!(err, RotationError::UnknownToken);
        assert!(session.is_active());
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let p0 = pair("g0");
        let mut session = fresh_session(&p0);

        session.revoke();
        session.revoke();
        assert_eq!(session.state, SessionState::Revoked);
    }

    #[test]
    fn test_state_storage_encoding() {
        assert_eq!(SessionState::from_i16(0), Some(SessionState::Active));
        assert_eq!(SessionState::from_i16(1), Some(SessionState::Revoked));
        assert_eq!(SessionState::from_i16(7), None);
        assert_eq!(SessionState::Active.as_i16(), 0);
    }
}
