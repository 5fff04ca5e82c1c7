//! Use Case Flow Tests
//!
//! End-to-end flows over the in-memory repository and HMAC issuer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::{
    AuthConfig, RefreshSessionInput, RefreshSessionUseCase, SignInInput, SignInUseCase,
    SignOutInput, SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::entity::user::RegisteredUser;
use crate::domain::repository::{SessionStore, TokenIssuer, UserDirectory};
use crate::domain::value_object::email::Email;
use crate::error::AuthError;
use crate::infra::memory::InMemoryAuthRepository;
use crate::infra::token::HmacTokenIssuer;

const GOOD_PASSWORD: &str = "@ma4ingl1-$3cURe#p4ssw0rd";

struct Env {
    repo: Arc<InMemoryAuthRepository>,
    issuer: Arc<HmacTokenIssuer>,
    config: Arc<AuthConfig>,
}

fn env() -> Env {
    let config = Arc::new(AuthConfig::with_random_secret());
    Env {
        repo: Arc::new(InMemoryAuthRepository::new()),
        issuer: Arc::new(HmacTokenIssuer::new(&config)),
        config,
    }
}

fn sign_up_input(email: &str) -> SignUpInput {
    SignUpInput {
        first_name: "Larry".to_string(),
        last_name: "Larson".to_string(),
        email: email.to_string(),
        password: GOOD_PASSWORD.to_string(),
    }
}

impl Env {
    fn sign_up_uc(
        &self,
    ) -> SignUpUseCase<InMemoryAuthRepository, InMemoryAuthRepository, HmacTokenIssuer> {
        SignUpUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.issuer.clone(),
            self.config.clone(),
        )
    }

    fn sign_in_uc(
        &self,
    ) -> SignInUseCase<InMemoryAuthRepository, InMemoryAuthRepository, HmacTokenIssuer> {
        SignInUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.issuer.clone(),
            self.config.clone(),
        )
    }

    fn refresh_uc(&self) -> RefreshSessionUseCase<InMemoryAuthRepository, HmacTokenIssuer> {
        RefreshSessionUseCase::new(self.repo.clone(), self.issuer.clone(), self.config.clone())
    }

    fn sign_out_uc(&self) -> SignOutUseCase<InMemoryAuthRepository, HmacTokenIssuer> {
        SignOutUseCase::new(self.repo.clone(), self.issuer.clone())
    }
}

// ============================================================================
// Sign Up
// ============================================================================

#[tokio::test]
async fn sign_up_creates_user_and_first_session() {
    let env = env();

    let output = env
        .sign_up_uc()
        .execute(sign_up_input("larry.larson@example.com"))
        .await
        .unwrap();

    assert_eq!(output.user.first_name, "Larry");
    assert_eq!(output.user.email.as_str(), "larry.larson@example.com");

    // The session exists with exactly the sign-up token pair
    let session = env
        .repo
        .find_by_id(&output.session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(session.is_active());
    assert_eq!(session.token_family().len(), 1);
    assert_eq!(session.generation(), 0);

    // Issued tokens verify against the issuer
    let claims = env
        .issuer
        .verify_access(&output.session.tokens.access_token)
        .unwrap();
    assert_eq!(claims.user_id, output.user.user_id);
    assert_eq!(claims.session_id, output.session.session_id);
    assert_eq!(claims.generation, 0);
}

#[tokio::test]
async fn sign_up_rejects_weak_passwords() {
    let env = env();

    for bad in [
        "alllowercase1!", // no uppercase
        "ALLUPPERCASE1!", // no lowercase
        "NoDigitsHere!",  // no digit
        "NoSpecials123",  // no special character
        "Sh0rt!",         // too short
    ] {
        let err = env
            .sign_up_uc()
            .execute(SignUpInput {
                password: bad.to_string(),
                ..sign_up_input("weak@example.com")
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, AuthError::WeakPassword(_)),
            "expected WeakPassword for {:?}, got {:?}",
            bad,
            err
        );
        // The message is the bare policy violation, no status prefix
        assert!(!err.to_string().contains("[Bad Request]"));
    }
}

#[tokio::test]
async fn sign_up_rejects_invalid_email() {
    let env = env();
    let err = env
        .sign_up_uc()
        .execute(SignUpInput {
            email: "not-an-email".to_string(),
            ..sign_up_input("x@example.com")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
}

/// Directory wrapper that counts register calls
struct CountingDirectory {
    inner: Arc<InMemoryAuthRepository>,
    register_calls: AtomicUsize,
}

impl UserDirectory for CountingDirectory {
    async fn find_by_email(
        &self,
        email: &Email,
    ) -> crate::error::AuthResult<Option<RegisteredUser>> {
        self.inner.find_by_email(email).await
    }

    async fn register(&self, user: &RegisteredUser) -> crate::error::AuthResult<()> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.register(user).await
    }
}

#[tokio::test]
async fn sign_up_duplicate_email_conflicts_without_registering() {
    let env = env();
    let directory = Arc::new(CountingDirectory {
        inner: env.repo.clone(),
        register_calls: AtomicUsize::new(0),
    });

    let use_case = SignUpUseCase::new(
        directory.clone(),
        env.repo.clone(),
        env.issuer.clone(),
        env.config.clone(),
    );

    use_case
        .execute(sign_up_input("dup@example.com"))
        .await
        .unwrap();
    assert_eq!(directory.register_calls.load(Ordering::SeqCst), 1);

    let err = use_case
        .execute(sign_up_input("dup@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailAlreadyRegistered));

    // The conflict was detected before any write
    assert_eq!(directory.register_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sign_up_duplicate_email_wins_over_weak_password() {
    let env = env();

    env.sign_up_uc()
        .execute(sign_up_input("dup@example.com"))
        .await
        .unwrap();

    // The taken address conflicts before the password is judged
    let err = env
        .sign_up_uc()
        .execute(SignUpInput {
            password: "weak".to_string(),
            ..sign_up_input("dup@example.com")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailAlreadyRegistered));
}

// ============================================================================
// Sign In
// ============================================================================

#[tokio::test]
async fn sign_in_opens_independent_session() {
    let env = env();

    let signed_up = env
        .sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();

    let signed_in = env
        .sign_in_uc()
        .execute(SignInInput {
            email: "larry@example.com".to_string(),
            password: GOOD_PASSWORD.to_string(),
        })
        .await
        .unwrap();

    assert_ne!(signed_in.session.session_id, signed_up.session.session_id);

    // Both sessions are live, each with a single-entry family
    let sessions = env
        .repo
        .find_by_user_id(&signed_up.user.user_id)
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);
    for session in &sessions {
        assert!(session.is_active());
        assert_eq!(session.token_family().len(), 1);
    }
}

#[tokio::test]
async fn sign_in_failures_are_indistinguishable() {
    let env = env();

    env.sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();

    // Unknown email
    let unknown = env
        .sign_in_uc()
        .execute(SignInInput {
            email: "nobody@example.com".to_string(),
            password: GOOD_PASSWORD.to_string(),
        })
        .await
        .unwrap_err();

    // Known email, wrong password
    let wrong = env
        .sign_in_uc()
        .execute(SignInInput {
            email: "larry@example.com".to_string(),
            password: "Wr0ng-but-v4lid!Pass".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
    assert_eq!(unknown.status_code(), wrong.status_code());
}

#[tokio::test]
async fn sign_in_email_is_case_sensitive() {
    let env = env();

    env.sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();

    let err = env
        .sign_in_uc()
        .execute(SignInInput {
            email: "Larry@Example.com".to_string(),
            password: GOOD_PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

// ============================================================================
// Refresh and Replay
// ============================================================================

#[tokio::test]
async fn refresh_rotates_token_family() {
    let env = env();

    let output = env
        .sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();
    let r0 = output.session.tokens.refresh_token.clone();

    let refreshed = env
        .refresh_uc()
        .execute(RefreshSessionInput {
            refresh_token: r0.as_str().to_string(),
        })
        .await
        .unwrap();

    assert_eq!(refreshed.session.session_id, output.session.session_id);
    assert_ne!(
        refreshed.session.tokens.refresh_token.as_str(),
        r0.as_str()
    );

    let session = env
        .repo
        .find_by_id(&output.session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.generation(), 1);
    assert_eq!(session.token_family().len(), 2);
}

#[tokio::test]
async fn replayed_refresh_token_revokes_session() {
    let env = env();

    let output = env
        .sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();
    let r0 = output.session.tokens.refresh_token.clone();

    // Legitimate rotation: R0 -> R1
    let refreshed = env
        .refresh_uc()
        .execute(RefreshSessionInput {
            refresh_token: r0.as_str().to_string(),
        })
        .await
        .unwrap();
    let r1 = refreshed.session.tokens.refresh_token.clone();

    // Replaying R0 fails and kills the session
    let err = env
        .refresh_uc()
        .execute(RefreshSessionInput {
            refresh_token: r0.as_str().to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidRefreshToken));

    let session = env
        .repo
        .find_by_id(&output.session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!session.is_active());

    // The otherwise-valid R1 is now dead too
    let err = env
        .refresh_uc()
        .execute(RefreshSessionInput {
            refresh_token: r1.as_str().to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidRefreshToken));
}

#[tokio::test]
async fn refresh_rejects_garbage_and_foreign_tokens() {
    let env = env();

    env.sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();

    for bad in ["", "garbage", "rt.a.b.c.d.e"] {
        let err = env
            .refresh_uc()
            .execute(RefreshSessionInput {
                refresh_token: bad.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    // Signed by someone else's secret
    let foreign_env = env_with_user().await;
    let err = env
        .refresh_uc()
        .execute(RefreshSessionInput {
            refresh_token: foreign_env.1,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidRefreshToken));
}

async fn env_with_user() -> (Env, String) {
    let env = env();
    let output = env
        .sign_up_uc()
        .execute(sign_up_input("someone@example.com"))
        .await
        .unwrap();
    let token = output.session.tokens.refresh_token.as_str().to_string();
    (env, token)
}

// ============================================================================
// Sign Out
// ============================================================================

#[tokio::test]
async fn sign_out_revokes_session() {
    let env = env();

    let output = env
        .sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();
    let refresh = output.session.tokens.refresh_token.as_str().to_string();

    env.sign_out_uc()
        .execute(SignOutInput {
            refresh_token: refresh.clone(),
        })
        .await
        .unwrap();

    let session = env
        .repo
        .find_by_id(&output.session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!session.is_active());

    // The refresh token is dead after sign-out
    let err = env
        .refresh_uc()
        .execute(RefreshSessionInput {
            refresh_token: refresh,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidRefreshToken));
}

#[tokio::test]
async fn sign_out_is_idempotent() {
    let env = env();

    let output = env
        .sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();
    let refresh = output.session.tokens.refresh_token.as_str().to_string();

    for _ in 0..2 {
        env.sign_out_uc()
            .execute(SignOutInput {
                refresh_token: refresh.clone(),
            })
            .await
            .unwrap();
    }

    // Garbage tokens are also a no-op success
    env.sign_out_uc()
        .execute(SignOutInput {
            refresh_token: "garbage".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn sign_out_all_revokes_every_session() {
    let env = env();

    let first = env
        .sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();

    let second = env
        .sign_in_uc()
        .execute(SignInInput {
            email: "larry@example.com".to_string(),
            password: GOOD_PASSWORD.to_string(),
        })
        .await
        .unwrap();

    env.sign_out_uc()
        .execute_all(SignOutInput {
            refresh_token: second.session.tokens.refresh_token.as_str().to_string(),
        })
        .await
        .unwrap();

    let sessions = env
        .repo
        .find_by_user_id(&first.user.user_id)
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);
    for session in &sessions {
        assert!(!session.is_active());
    }

    // Neither refresh token survives
    for token in [
        first.session.tokens.refresh_token.as_str(),
        second.session.tokens.refresh_token.as_str(),
    ] {
        let err = env
            .refresh_uc()
            .execute(RefreshSessionInput {
                refresh_token: token.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }
}

#[tokio::test]
async fn sign_out_one_session_leaves_others_alive() {
    let env = env();

    let first = env
        .sign_up_uc()
        .execute(sign_up_input("larry@example.com"))
        .await
        .unwrap();

    let second = env
        .sign_in_uc()
        .execute(SignInInput {
            email: "larry@example.com".to_string(),
            password: GOOD_PASSWORD.to_string(),
        })
        .await
        .unwrap();

    env.sign_out_uc()
        .execute(SignOutInput {
            refresh_token: first.session.tokens.refresh_token.as_str().to_string(),
        })
        .await
        .unwrap();

    // The second session still refreshes
    env.refresh_uc()
        .execute(RefreshSessionInput {
            refresh_token: second.session.tokens.refresh_token.as_str().to_string(),
        })
        .await
        .unwrap();
}
