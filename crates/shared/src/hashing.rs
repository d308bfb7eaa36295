//! Storage hashing for plaintext access codes using Argon2id.
//!
//! Codes are hashed the same way passwords are: a random salt per call and a
//! deliberately expensive derivation. The resulting PHC string is the only form
//! of the code that must be persisted.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Error type for hashing operations.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to hash code: {0}")]
    HashFailed(String),

    #[error("Failed to verify code: {0}")]
    VerifyFailed(String),

    #[error("Invalid code hash format")]
    InvalidHashFormat,
}

/// Argon2id parameters following OWASP recommendations (2024).
/// - Memory: 19456 KiB (19 MiB)
/// - Iterations: 2
/// - Parallelism: 1
pub const DEFAULT_MEMORY_KIB: u32 = 19456;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Argon2id hasher with fixed cost parameters.
///
/// Cheap to clone; the Argon2 context is rebuilt per call so a hasher can be
/// moved into blocking tasks freely.
#[derive(Debug, Clone)]
pub struct CodeHasher {
    params: Params,
}

impl CodeHasher {
    /// Creates a hasher with explicit cost parameters.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, Some(OUTPUT_LEN))
            .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a plaintext code, returning a PHC-formatted string.
    ///
    /// Two calls with the same input produce different strings because each
    /// call draws a fresh salt.
    pub fn hash(&self, plain: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::HashFailed(e.to_string()))
    }

    /// Verifies a plaintext code against a stored PHC hash.
    ///
    /// The parameters embedded in the hash are used, so hashes produced with
    /// older cost settings remain verifiable.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashError> {
        verify_code(plain, hash)
    }
}

impl Default for CodeHasher {
    fn default() -> Self {
        Self {
            params: Params::new(
                DEFAULT_MEMORY_KIB,
                DEFAULT_ITERATIONS,
                DEFAULT_PARALLELISM,
                Some(OUTPUT_LEN),
            )
            .unwrap_or_default(),
        }
    }
}

/// Verifies a plaintext code against a stored PHC hash.
pub fn verify_code(plain: &str, hash: &str) -> Result<bool, HashError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| HashError::InvalidHashFormat)?;

    match Argon2::default().verify_password(plain.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(HashError::VerifyFailed(e.to_string())),
    }
}
