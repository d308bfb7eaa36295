//! Domain layer for the access code service.
//!
//! This crate contains:
//! - Domain models (AccessCode, views, requests, batches, exports, dashboard)
//! - The storage port the persistence layer implements
//! - Business logic services (generation, status, listing, batches, export)
//! - Domain error types

pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use error::{DomainError, ValidationError};
