use crate::workflows::allocation::DEFAULT_CLUB_CAPACITY;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub allocation: AllocationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            allocation: AllocationConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Allocation defaults and the location of persisted club capacities.
#[derive(Debug, Clone)]
pub struct AllocationConfig {
    /// Capacity given to clubs the first time a submission mentions them.
    pub default_capacity: u32,
    pub capacity_store: PathBuf,
    /// Fixed round count; `None` runs as many rounds as the largest quota.
    pub rounds: Option<usize>,
}

impl AllocationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_capacity = match env::var("ALLOC_DEFAULT_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(ConfigError::InvalidCapacity { value: raw })?,
            Err(_) => DEFAULT_CLUB_CAPACITY,
        };

        let capacity_store = env::var("ALLOC_CAPACITY_STORE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("club-capacities.json"));

        let rounds = match env::var("ALLOC_ROUNDS") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|rounds| *rounds > 0)
                    .ok_or(ConfigError::InvalidRounds { value: raw })?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            default_capacity,
            capacity_store,
            rounds,
        })
    }
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CLUB_CAPACITY,
            capacity_store: PathBuf::from("club-capacities.json"),
            rounds: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCapacity { value: String },
    InvalidRounds { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCapacity { value } => write!(
                f,
                "ALLOC_DEFAULT_CAPACITY must be a positive integer, got '{value}'"
            ),
            ConfigError::InvalidRounds { value } => {
                write!(f, "ALLOC_ROUNDS must be a positive integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCapacity { .. }
            | ConfigError::InvalidRounds { .. } => None,
        }
    }
}
