//! Repository implementations for database operations.

pub mod access_code;

pub use access_code::PgAccessCodeRepository;
