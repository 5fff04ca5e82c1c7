//! PublicId Value Object
//!
//! Compact, URL-safe identifier exposed to clients instead of the
//! internal UUID. Wraps a Nanoid.

use std::str::FromStr;

use kernel::error::app_error::{AppError, AppResult};
use nid::Nanoid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicId(pub Nanoid);

impl PublicId {
    #[inline]
    pub fn new() -> Self {
        Self(Nanoid::new())
    }

    #[inline]
    pub fn parse_str(s: &str) -> AppResult<Self> {
        Nanoid::from_str(s)
            .map(PublicId)
            .map_err(|e| AppError::bad_request(format!("Invalid public id: {}", e)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PublicId {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        PublicId::parse_str(s)
    }
}

impl Default for PublicId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PublicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_new() {
        let public_id = PublicId::new();
        assert_eq!(public_id.as_str().len(), 21); // Default Nanoid length
    }

    #[test]
    fn test_public_id_parse_str() {
        let id_str = "0123456789abcdefghi01";
        let public_id = PublicId::parse_str(id_str).unwrap();
        assert_eq!(public_id.as_str(), id_str);
    }

    #[test]
    fn test_public_id_parse_str_invalid() {
        assert!(PublicId::parse_str("not a nanoid!").is_err());
    }
}
