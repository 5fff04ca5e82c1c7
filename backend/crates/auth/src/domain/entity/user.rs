//! User Entity
//!
//! Registered user as persisted, plus the validated sign-up input.

use chrono::{DateTime, Utc};
use kernel::error::app_error::{AppError, AppResult};

use crate::domain::value_object::{
    email::Email, public_id::PublicId, user_id::UserId, user_password::RawPassword,
    user_password::UserPassword,
};

/// Maximum length for first/last name
const NAME_MAX_LENGTH: usize = 100;

/// Registered user entity
///
/// The password field only ever holds the hashed form. There is no way
/// to construct this entity from a plaintext password directly.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    pub first_name: String,
    pub last_name: String,
    /// Email (unique, case-sensitive)
    pub email: Email,
    /// Argon2id password hash
    pub password: UserPassword,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl RegisteredUser {
    /// Create a new registered user from validated sign-up input
    pub fn new(new_user: NewUser, password: UserPassword) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            public_id: PublicId::new(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            password,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated sign-up input
///
/// Holds the raw password until the use case hashes it. Not Clone, so
/// the plaintext cannot fan out.
#[derive(Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: RawPassword,
}

impl NewUser {
    /// Validate names and assemble sign-up input
    ///
    /// Email and password arrive already validated by their value
    /// object constructors.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Email,
        password: RawPassword,
    ) -> AppResult<Self> {
        let first_name = Self::validate_name(first_name.into(), "First name")?;
        let last_name = Self::validate_name(last_name.into(), "Last name")?;

        Ok(Self {
            first_name,
            last_name,
            email,
            password,
        })
    }

    fn validate_name(name: String, label: &str) -> AppResult<String> {
        let name = name.trim().to_string();

        if name.is_empty() {
            return Err(AppError::bad_request(format!("{} cannot be empty", label)));
        }

        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "{} must be at most {} characters",
                label, NAME_MAX_LENGTH
            )));
        }

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> NewUser {
        NewUser::new(
            "Larry",
            "Larson",
            Email::new("larry@example.com").unwrap(),
            RawPassword::new("@ma4ingl1-$3cURe#p4ssw0rd".to_string()).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_user_trims_names() {
        let input = NewUser::new(
            "  Larry ",
            " Larson  ",
            Email::new("larry@example.com").unwrap(),
            RawPassword::new("@ma4ingl1-$3cURe#p4ssw0rd".to_string()).unwrap(),
        )
        .unwrap();

        assert_eq!(input.first_name, "Larry");
        assert_eq!(input.last_name, "Larson");
    }

    #[test]
    fn test_new_user_rejects_empty_names() {
        let email = Email::new("larry@example.com").unwrap();
        let password = RawPassword::new("@ma4ingl1-$3cURe#p4ssw0rd".to_string()).unwrap();
        assert!(NewUser::new("", "Larson", email, password).is_err());

        let email = Email::new("larry@example.com").unwrap();
        let password = RawPassword::new("@ma4ingl1-$3cURe#p4ssw0rd".to_string()).unwrap();
        assert!(NewUser::new("Larry", "   ", email, password).is_err());
    }

    #[test]
    fn test_registered_user_new() {
        let input = valid_input();
        let password = UserPassword::from_raw(&input.password, None).unwrap();
        let user = RegisteredUser::new(input, password);

        assert_eq!(user.first_name, "Larry");
        assert_eq!(user.email.as_str(), "larry@example.com");
        assert_eq!(user.public_id.as_str().len(), 21);
        assert_eq!(user.created_at, user.updated_at);
    }
}
