use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except `JWT_SECRET` have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Root directory for video sources, studio inputs and live output.
    pub storage_dir: PathBuf,
    /// Maximum HTTP request body size in bytes. Upload endpoints carry
    /// whole media files, so the default is 4 GiB rather than a web-form
    /// sized limit.
    pub max_body_size: usize,
    /// Processing jobs whose last update is older than this are returned
    /// to the pending pool. `0` disables the sweep (default: `0`).
    pub stalled_job_ttl_secs: u64,
    /// How often the stalled-job sweep runs (default: `60`).
    pub stalled_jobs_interval_secs: u64,
    /// When true, deleting a runner sends its in-flight jobs back to the
    /// pending pool instead of leaving them for the sweep.
    pub runner_delete_aborts_jobs: bool,
    /// JWT configuration for the admin surface.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default       |
    /// |-----------------------------|---------------|
    /// | `HOST`                      | `0.0.0.0`     |
    /// | `PORT`                      | `3000`        |
    /// | `CORS_ORIGINS`              | (none)        |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`          |
    /// | `STORAGE_DIR`               | `./storage`   |
    /// | `MAX_BODY_SIZE`             | `4294967296`  |
    /// | `STALLED_JOB_TTL_SECS`      | `0` (off)     |
    /// | `STALLED_JOBS_INTERVAL_SECS`| `60`          |
    /// | `RUNNER_DELETE_ABORTS_JOBS` | `false`       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage_dir =
            PathBuf::from(std::env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".into()));

        // 4 GiB: covers produced VOD files; HLS chunks are far smaller.
        let max_body_size: usize = std::env::var("MAX_BODY_SIZE")
            .unwrap_or_else(|_| (4u64 * 1024 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_BODY_SIZE must be a valid usize");

        let stalled_job_ttl_secs: u64 = std::env::var("STALLED_JOB_TTL_SECS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("STALLED_JOB_TTL_SECS must be a valid u64");

        let stalled_jobs_interval_secs: u64 = std::env::var("STALLED_JOBS_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("STALLED_JOBS_INTERVAL_SECS must be a valid u64");

        let runner_delete_aborts_jobs = std::env::var("RUNNER_DELETE_ABORTS_JOBS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_dir,
            max_body_size,
            stalled_job_ttl_secs,
            stalled_jobs_interval_secs,
            runner_delete_aborts_jobs,
            jwt,
        }
    }
}
