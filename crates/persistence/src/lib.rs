//! Persistence layer for the access code service.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - The PostgreSQL access code repository
//! - Query timing metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use db::{create_pool, DatabaseConfig};
pub use repositories::PgAccessCodeRepository;
