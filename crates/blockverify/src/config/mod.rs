use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::screening::{RetentionPolicy, ScoringConfig, ScoringConfigError, MAX_RETENTION_DAYS};

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
    pub screening: ScreeningSettings,
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
            screening: ScreeningSettings::from_env()?,
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

/// Scorer tuning and history retention.
#[derive(Debug, Clone, Default)]
pub struct ScreeningSettings {
    pub scoring: ScoringConfig,
    pub retention: RetentionPolicy,
}

impl ScreeningSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let scoring = match env::var("SCREENING_CONFIG_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::scoring_from_file(PathBuf::from(path))?,
            _ => ScoringConfig::default(),
        };

        let retention = RetentionPolicy {
            max_entries: bounded_var("SCREENING_HISTORY_MAX_ENTRIES", usize::MAX)?,
            max_age_days: bounded_var("SCREENING_HISTORY_RETENTION_DAYS", MAX_RETENTION_DAYS)?,
        };

        Ok(Self { scoring, retention })
    }

    pub fn scoring_from_file(path: PathBuf) -> Result<ScoringConfig, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| {
            ConfigError::ScoringFile {
                path: path.clone(),
                source,
            }
        })?;
        ScoringConfig::from_json(&raw).map_err(ConfigError::Scoring)
    }
}

/// Unset or blank is `None`; otherwise the value must lie in `1..=max`.
fn bounded_var<T>(name: &'static str, max: T) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() && value <= max => Ok(Some(value)),
            _ => Err(ConfigError::InvalidRetention { variable: name }),
        },
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRetention { variable: &'static str },
    ScoringFile { path: PathBuf, source: std::io::Error },
    Scoring(ScoringConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRetention { variable } => {
                write!(f, "{variable} must be a positive integer within range")
            }
            ConfigError::ScoringFile { path, .. } => {
                write!(f, "unable to read scoring config {}", path.display())
            }
            ConfigError::Scoring(err) => write!(f, "invalid scoring config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidRetention { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::ScoringFile { source, .. } => Some(source),
            ConfigError::Scoring(err) => Some(err),
        }
    }
}
