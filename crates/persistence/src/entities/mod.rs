//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod access_code;

pub use access_code::AccessCodeEntity;
