//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the protocol bodies that create or mutate it

pub mod registration_token;
pub mod runner;
pub mod runner_job;
pub mod status;
pub mod video;
