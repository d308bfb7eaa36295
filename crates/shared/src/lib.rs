//! Shared utilities for the access code service.
//!
//! This crate provides common functionality used across all other crates:
//! - Slow, salted hashing of plaintext codes with Argon2id
//! - Offset pagination helpers
//! - Common validation logic

pub mod hashing;
pub mod pagination;
pub mod validation;
