//! Domain Layer
//!
//! Entities, value objects, and the port traits implemented by infra.

pub mod entity;
pub mod repository;
pub mod value_object;
