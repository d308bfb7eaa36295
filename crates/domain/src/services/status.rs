//! Status derivation.
//!
//! A code is `inactive` once it has expired or its usage counter has reached
//! the cap; otherwise it is `active`. The rule is applied identically by every
//! surface, with one `now` captured per request.

use chrono::{DateTime, Utc};

use crate::models::CodeStatus;

/// Derives the status of a code at `now`.
///
/// An absent expiry is treated as already expired.
pub fn derive_status(
    expires_at: Option<DateTime<Utc>>,
    used_count: i32,
    max_uses: i32,
    now: DateTime<Utc>,
) -> CodeStatus {
    match expires_at {
        Some(expires_at) if expires_at > now => {
            if used_count >= max_uses {
                CodeStatus::Inactive
            } else {
                CodeStatus::Active
            }
        }
        _ => CodeStatus::Inactive,
    }
}

/// Same as [`derive_status`] for an RFC 3339 expiry string.
///
/// Strings that do not parse as a valid instant yield `inactive`.
pub fn derive_status_from_str(
    expires_at: &str,
    used_count: i32,
    max_uses: i32,
    now: DateTime<Utc>,
) -> CodeStatus {
    derive_status(
        shared::validation::parse_instant(expires_at),
        used_count,
        max_uses,
        now,
    )
}
