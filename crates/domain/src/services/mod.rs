//! Domain services for the access code service.
//!
//! Services contain business logic that operates on domain models through the
//! storage port.

pub mod batches;
pub mod code_generator;
pub mod codes;
pub mod dashboard;
pub mod export;
pub mod listing;
pub mod status;

pub use codes::{
    normalize_custom_code, normalize_max_uses, AccessCodeService, CodeLimits, MAX_BATCH_LIMIT,
    RANDOM_INSERT_ATTEMPTS, STATUS_FILTER_FETCH_CAP,
};
pub use code_generator::{generate_plain_code, ALPHABET, DEFAULT_CODE_LENGTH};
pub use status::derive_status;
