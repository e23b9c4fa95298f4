//! Credential handling: admin JWTs and runner capability tokens.

pub mod jwt;
pub mod runner;
