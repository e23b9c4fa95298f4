//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod registration_token_repo;
pub mod runner_job_repo;
pub mod runner_repo;
pub mod video_repo;

pub use registration_token_repo::RegistrationTokenRepo;
pub use runner_job_repo::RunnerJobRepo;
pub use runner_repo::RunnerRepo;
pub use video_repo::VideoRepo;
