//! Capability token generation and format validation.
//!
//! Three bearer token kinds flow through the runner protocol:
//!
//! - registration tokens (`mgreg-...`) - onboard a new runner,
//! - runner tokens (`mgrt-...`) - identify a registered runner on every call,
//! - job tokens (`mgjt-...`) - prove the lease on one specific job.
//!
//! All are server-minted random alphanumerics. Incoming values are checked
//! for shape (length/charset) BEFORE any store lookup: a malformed value is
//! a validation error, a well-formed unknown value is a not-found. The two
//! must stay distinguishable so dispatch code can log abuse separately
//! from user error.

use rand::Rng;
use subtle::ConstantTimeEq;

use crate::error::CoreError;

/// Prefix of registration token values.
pub const REGISTRATION_TOKEN_PREFIX: &str = "mgreg-";

/// Prefix of runner token values.
pub const RUNNER_TOKEN_PREFIX: &str = "mgrt-";

/// Prefix of job token values.
pub const JOB_TOKEN_PREFIX: &str = "mgjt-";

/// Length of the random alphanumeric part of every token.
pub const TOKEN_RANDOM_LENGTH: usize = 32;

/// Maximum accepted length for any incoming token value. Values longer
/// than this are rejected before lookup.
pub const TOKEN_MAX_LENGTH: usize = 1000;

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Mint a new registration token value.
pub fn generate_registration_token() -> String {
    format!(
        "{REGISTRATION_TOKEN_PREFIX}{}",
        random_alphanumeric(TOKEN_RANDOM_LENGTH)
    )
}

/// Mint a new runner token value.
pub fn generate_runner_token() -> String {
    format!(
        "{RUNNER_TOKEN_PREFIX}{}",
        random_alphanumeric(TOKEN_RANDOM_LENGTH)
    )
}

/// Mint a new job token value. Bound 1:1 to a `(job, runner)` pair at
/// accept time; invalidated on every terminal transition and on abort.
pub fn generate_job_token() -> String {
    format!(
        "{JOB_TOKEN_PREFIX}{}",
        random_alphanumeric(TOKEN_RANDOM_LENGTH)
    )
}

/// Shape check for an incoming token value.
///
/// A token is well-formed when it is non-empty, at most
/// [`TOKEN_MAX_LENGTH`] bytes, and printable ASCII without spaces. The
/// prefix is intentionally NOT checked here: the registration flow must
/// answer 404 (unknown) rather than 400 (malformed) for a plausible but
/// wrong secret.
pub fn is_token_format_valid(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= TOKEN_MAX_LENGTH
        && value.bytes().all(|b| b.is_ascii_graphic())
}

/// Validate an incoming token value, naming the field in the error.
pub fn check_token_format(field: &str, value: &str) -> Result<(), CoreError> {
    if is_token_format_valid(value) {
        return Ok(());
    }
    Err(CoreError::Validation(format!("Invalid {field}")))
}

/// Constant-time equality for bearer secrets.
pub fn tokens_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
