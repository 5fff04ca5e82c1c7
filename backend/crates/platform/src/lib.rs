//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, constant-time compare)
//! - Password policy and hashing (Argon2id)

pub mod crypto;
pub mod password;
