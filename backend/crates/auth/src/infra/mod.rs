//! Infrastructure Layer
//!
//! Adapters for the domain's persistence and signing traits.

pub mod memory;
pub mod postgres;
pub mod token;

pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;
pub use token::HmacTokenIssuer;
