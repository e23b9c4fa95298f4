//! HTTP request handlers, one module per resource.

pub mod health;
pub mod job_files;
pub mod registration_tokens;
pub mod runner_jobs;
pub mod runners;
pub mod videos;
