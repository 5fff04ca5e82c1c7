//! Presentation Layer
//!
//! HTTP surface: DTOs, handlers, router and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
