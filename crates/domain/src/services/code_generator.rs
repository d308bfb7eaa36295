//! Plaintext code generation and storage hashing.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use shared::hashing::CodeHasher;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::DomainError;

/// Uppercase letters and digits without the confusable I, L, O, 0 and 1.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 12;

/// Generates a random code of `length` symbols from [`ALPHABET`].
///
/// Each symbol is one OS CSPRNG byte reduced modulo the alphabet size. Codes
/// are not unique by construction; storage enforces uniqueness.
pub fn generate_plain_code(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect()
}

/// Generates `count` distinct codes of the default length.
pub fn generate_batch(count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    while codes.len() < count {
        let code = generate_plain_code(DEFAULT_CODE_LENGTH);
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}

/// Hashes one code on the blocking pool.
pub async fn hash_code(hasher: &CodeHasher, plain: &str) -> Result<String, DomainError> {
    let hasher = hasher.clone();
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || hasher.hash(&plain))
        .await
        .map_err(|e| DomainError::Storage(format!("Hashing task failed: {}", e)))?
        .map_err(DomainError::from)
}

/// Hashes every code on the blocking pool, at most `parallelism` at a time.
///
/// The returned hashes are in input order.
pub async fn hash_codes(
    hasher: &CodeHasher,
    plains: &[String],
    parallelism: usize,
) -> Result<Vec<String>, DomainError> {
    let permits = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut tasks = JoinSet::new();

    for (index, plain) in plains.iter().cloned().enumerate() {
        let hasher = hasher.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| DomainError::Storage(format!("Hashing pool closed: {}", e)))?;
            let hash = tokio::task::spawn_blocking(move || hasher.hash(&plain))
                .await
                .map_err(|e| DomainError::Storage(format!("Hashing task failed: {}", e)))??;
            Ok::<_, DomainError>((index, hash))
        });
    }

    let mut hashes = vec![String::new(); plains.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, hash) =
            joined.map_err(|e| DomainError::Storage(format!("Hashing task failed: {}", e)))??;
        hashes[index] = hash;
    }
    Ok(hashes)
}

/// Default hashing concurrency: the number of available cores.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::hashing::verify_code;

    fn cheap_hasher() -> CodeHasher {
        CodeHasher::new(64, 1, 1).unwrap()
    }

    #[test]
    fn test_alphabet_excludes_confusables() {
        assert_eq!(ALPHABET.len(), 31);
        for c in [b'I', b'L', b'O', b'0', b'1'] {
            assert!(!ALPHABET.contains(&c));
        }
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..200 {
            let code = generate_plain_code(DEFAULT_CODE_LENGTH);
            assert_eq!(code.len(), DEFAULT_CODE_LENGTH);
            assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
            assert!(!code.contains(['I', 'L', 'O', '0', '1']));
        }
    }

    #[test]
    fn test_generate_custom_length() {
        assert_eq!(generate_plain_code(6).len(), 6);
        assert!(generate_plain_code(0).is_empty());
    }

    #[test]
    fn test_generate_batch_is_distinct() {
        let codes = generate_batch(100);
        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), 100);
        assert_eq!(unique.len(), 100);
    }

    #[tokio::test]
    async fn test_hash_code_is_salted() {
        let hasher = cheap_hasher();
        let first = hash_code(&hasher, "K7PQ9XW2MRTA").await.unwrap();
        let second = hash_code(&hasher, "K7PQ9XW2MRTA").await.unwrap();
        assert_ne!(first, second);
        assert!(verify_code("K7PQ9XW2MRTA", &first).unwrap());
    }

    #[tokio::test]
    async fn test_hash_codes_preserves_order() {
        let hasher = cheap_hasher();
        let plains = generate_batch(6);
        let hashes = hash_codes(&hasher, &plains, 2).await.unwrap();

        assert_eq!(hashes.len(), plains.len());
        for (plain, hash) in plains.iter().zip(&hashes) {
            assert!(verify_code(plain, hash).unwrap());
        }
    }
}
