//! Domain logic for the MediaGrid remote runner subsystem.
//!
//! This crate has no internal dependencies so it can be used by the
//! API/repository layer and by any future CLI or worker tooling:
//!
//! - [`tokens`] - capability token generation and format validation.
//! - [`job_types`] - the closed tagged union of runner job types with
//!   their per-type success payload schemas.
//! - [`live`] - live chunk update validation (filename hygiene).
//! - [`pagination`] - `start`/`count`/`sort` validation for list endpoints.
//! - [`error`] - the domain error taxonomy shared by every layer.

pub mod error;
pub mod job_types;
pub mod live;
pub mod pagination;
pub mod roles;
pub mod runners;
pub mod tokens;
pub mod types;
