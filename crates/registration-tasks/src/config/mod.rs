use std::env;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_ACTOR_ID: &str = "registration-scheduled-task";

/// Distinguishes runtime behavior for different stages of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the scheduled job.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir = env::var("REGISTRATION_TASKS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let outbox_dir = env::var("REGISTRATION_TASKS_OUTBOX_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("outbox"));

        let actor_id = env::var("REGISTRATION_TASKS_ACTOR_ID")
            .unwrap_or_else(|_| DEFAULT_ACTOR_ID.to_string());
        if actor_id.trim().is_empty() {
            return Err(ConfigError::MissingActor);
        }

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            store: StoreConfig {
                data_dir,
                outbox_dir,
                actor_id: actor_id.trim().to_string(),
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Locations of the record snapshot and the outbox, plus the identity stamped on mutations.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub outbox_dir: PathBuf,
    pub actor_id: String,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingActor,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingActor => {
                write!(f, "REGISTRATION_TASKS_ACTOR_ID must not be blank")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
