//! PostgreSQL Repository Implementations
//!
//! Sessions span two tables: `sessions` carries the lifecycle state,
//! `session_tokens` carries the append-only token family. Rotation
//! runs in a transaction with the session row locked, so concurrent
//! rotations of the same head serialize and the loser takes the
//! replay path.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    session::{RefreshMatch, Session, SessionState, TokenRecord},
    user::RegisteredUser,
};
use crate::domain::repository::{RotationOutcome, SessionStore, UserDirectory};
use crate::domain::value_object::{
    email::Email,
    public_id::PublicId,
    session_id::SessionId,
    tokens::{TokenDigest, TokenPair},
    user_id::UserId,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_family(
        executor: impl sqlx::PgExecutor<'_>,
        session_id: Uuid,
    ) -> AuthResult<Vec<TokenRecord>> {
        let rows = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT
                session_id,
                generation,
                access_digest,
                refresh_digest,
                issued_at
            FROM session_tokens
            WHERE session_id = $1
            ORDER BY generation ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(executor)
        .await?;

        rows.into_iter().map(|r| r.into_record()).collect()
    }
}

// ============================================================================
// User Directory Implementation
// ============================================================================

impl UserDirectory for PgAuthRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<RegisteredUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                public_id,
                first_name,
                last_name,
                email,
                password_hash,
                created_at,
                updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn register(&self, user: &RegisteredUser) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                public_id,
                first_name,
                last_name,
                email,
                password_hash,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.public_id.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // Unique violation on email means the address is taken
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Err(AuthError::EmailAlreadyRegistered)
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Session Store Implementation
// ============================================================================

impl SessionStore for PgAuthRepository {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sessions (
                session_id,
                user_id,
                state,
                refresh_expires_at_ms,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(session.state.as_i16())
        .bind(session.refresh_expires_at_ms)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await?;

        for record in session.token_family() {
            sqlx::query(
                r#"
                INSERT INTO session_tokens (
                    session_id,
                    generation,
                    access_digest,
                    refresh_digest,
                    issued_at
                ) VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(session.session_id.as_uuid())
            .bind(record.generation as i32)
            .bind(record.access_digest.as_bytes().as_slice())
            .bind(record.refresh_digest.as_bytes().as_slice())
            .bind(record.issued_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                state,
                refresh_expires_at_ms,
                created_at,
                updated_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let family = Self::load_family(&self.pool, r.session_id).await?;
                Ok(Some(r.into_session(family)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                state,
                refresh_expires_at_ms,
                created_at,
                updated_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            let family = Self::load_family(&self.pool, row.session_id).await?;
            sessions.push(row.into_session(family)?);
        }
        Ok(sessions)
    }

    async fn rotate(
        &self,
        session_id: &SessionId,
        presented: &TokenDigest,
        next: &TokenPair,
        refresh_expires_at_ms: i64,
    ) -> AuthResult<RotationOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent rotations of the same session
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                state,
                refresh_expires_at_ms,
                created_at,
                updated_at
            FROM sessions
            WHERE session_id = $1
            FOR UPDATE
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(RotationOutcome::Unknown);
        };

        let family = Self::load_family(&mut *tx, row.session_id).await?;
        let mut session = row.into_session(family)?;

        if !session.is_active() {
            return Ok(RotationOutcome::Revoked);
        }

        match session.match_refresh(presented) {
            RefreshMatch::Head => {
                let now = Utc::now();
                let next_generation = session.generation() + 1;

                sqlx::query(
                    r#"
                    INSERT INTO session_tokens (
                        session_id,
                        generation,
                        access_digest,
                        refresh_digest,
                        issued_at
                    ) VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(session.session_id.as_uuid())
                .bind(next_generation as i32)
                .bind(next.access_token.digest().as_bytes().as_slice())
                .bind(next.refresh_token.digest().as_bytes().as_slice())
                .bind(now)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE sessions SET
                        refresh_expires_at_ms = $2,
                        updated_at = $3
                    WHERE session_id = $1
                    "#,
                )
                .bind(session.session_id.as_uuid())
                .bind(refresh_expires_at_ms)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;

                // Mirror the committed state on the entity we return
                let rotate_ok = session
                    .rotate(presented, next, refresh_expires_at_ms)
                    .is_ok();
                debug_assert!(rotate_ok);
                Ok(RotationOutcome::Rotated(session))
            }
            RefreshMatch::Superseded => {
                sqlx::query(
                    r#"
                    UPDATE sessions SET
                        state = $2,
                        updated_at = $3
                    WHERE session_id = $1
                    "#,
                )
                .bind(session.session_id.as_uuid())
                .bind(SessionState::Revoked.as_i16())
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;

                session.revoke();
                Ok(RotationOutcome::Replayed(session))
            }
            RefreshMatch::Unknown => Ok(RotationOutcome::Unknown),
        }
    }

    async fn revoke(&self, session_id: &SessionId) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE sessions SET
                state = $2,
                updated_at = $3
            WHERE session_id = $1 AND state != $2
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(SessionState::Revoked.as_i16())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let revoked = sqlx::query(
            r#"
            UPDATE sessions SET
                state = $2,
                updated_at = $3
            WHERE user_id = $1 AND state != $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(SessionState::Revoked.as_i16())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        // session_tokens rows go with the session via ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM sessions WHERE refresh_expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    public_id: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<RegisteredUser> {
        let public_id = PublicId::parse_str(&self.public_id)
            .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?;

        let password = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(RegisteredUser {
            user_id: UserId::from_uuid(self.user_id),
            public_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: Email::from_db(self.email),
            password,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    state: i16,
    refresh_expires_at_ms: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self, family: Vec<TokenRecord>) -> AuthResult<Session> {
        let state = SessionState::from_i16(self.state)
            .ok_or_else(|| AuthError::Internal(format!("Invalid session state: {}", self.state)))?;

        Ok(Session::from_storage(
            SessionId::from_uuid(self.session_id),
            UserId::from_uuid(self.user_id),
            state,
            family,
            self.refresh_expires_at_ms,
            self.created_at,
            self.updated_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    #[allow(dead_code)]
    session_id: Uuid,
    generation: i32,
    access_digest: Vec<u8>,
    refresh_digest: Vec<u8>,
    issued_at: DateTime<Utc>,
}

impl TokenRow {
    fn into_record(self) -> AuthResult<TokenRecord> {
        let access_digest = TokenDigest::from_bytes(&self.access_digest)
            .map_err(|len| AuthError::Internal(format!("Invalid access digest length: {}", len)))?;
        let refresh_digest = TokenDigest::from_bytes(&self.refresh_digest).map_err(|len| {
            AuthError::Internal(format!("Invalid refresh digest length: {}", len))
        })?;

        Ok(TokenRecord {
            generation: self.generation as u32,
            access_digest,
            refresh_digest,
            issued_at: self.issued_at,
        })
    }
}
