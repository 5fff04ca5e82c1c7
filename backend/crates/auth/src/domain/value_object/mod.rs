//! Value Object Module

pub mod email;
pub mod public_id;
pub mod session_id;
pub mod tokens;
pub mod user_id;
pub mod user_password;
