use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
const DEFAULT_JOB_RETENTION_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_path: String,
    /// Seconds a finished job and its document are kept before eviction.
    pub job_retention_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_path: String,
    pub output_path: String,
    /// Upload body limit in bytes.
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Load .env.local first (local overrides), then .env
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
                static_path: env::var("STATIC_PATH")
                    .unwrap_or_else(|_| "./web/static".to_string()),
                job_retention_secs: env::var("JOB_RETENTION_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_JOB_RETENTION_SECS),
            },
            storage: StorageConfig {
                upload_path: env::var("UPLOAD_PATH").unwrap_or_else(|_| "./uploads".to_string()),
                output_path: env::var("OUTPUT_PATH").unwrap_or_else(|_| "./output".to_string()),
                max_file_size: env::var("MAX_FILE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            },
            logging: LoggingConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}
