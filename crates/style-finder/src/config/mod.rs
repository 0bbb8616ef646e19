use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::quiz::validation::is_valid_email;

const DEFAULT_ADMIN_TOKEN: &str = "admin123";

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
    pub notification: NotificationConfig,
    pub admin: AdminConfig,
    pub queue: QueueConfig,
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
            notification: NotificationConfig::from_env()?,
            admin: AdminConfig::from_env(environment)?,
            queue: QueueConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Coach email delivery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub coach_email: String,
    pub backup_email: Option<String>,
    pub sender: String,
    pub enabled: bool,
    pub rate_limit_per_hour: u32,
    pub max_attempts: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            coach_email: "coach@example.com".to_string(),
            backup_email: None,
            sender: "noreply@stylefinder.com".to_string(),
            enabled: true,
            rate_limit_per_hour: 100,
            max_attempts: 3,
        }
    }
}

impl NotificationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let coach_email = env::var("COACH_EMAIL").unwrap_or(defaults.coach_email);
        if !is_valid_email(&coach_email) {
            return Err(ConfigError::InvalidEmail { key: "COACH_EMAIL" });
        }

        let backup_email = env::var("BACKUP_EMAIL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        if let Some(backup) = &backup_email {
            if !is_valid_email(backup) {
                return Err(ConfigError::InvalidEmail { key: "BACKUP_EMAIL" });
            }
        }

        let rate_limit_per_hour = match env::var("EMAIL_RATE_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|limit| (1..=10_000).contains(limit))
                .ok_or(ConfigError::InvalidRateLimit)?,
            Err(_) => defaults.rate_limit_per_hour,
        };

        let max_attempts = match env::var("EMAIL_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|attempts| *attempts > 0)
                .ok_or(ConfigError::InvalidMaxAttempts)?,
            Err(_) => defaults.max_attempts,
        };

        Ok(Self {
            coach_email,
            backup_email,
            sender: env::var("EMAIL_FROM").unwrap_or(defaults.sender),
            enabled: env::var("EMAIL_ENABLED")
                .map(|value| !value.trim().eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            rate_limit_per_hour,
            max_attempts,
        })
    }
}

/// Shared secrets guarding admin and cron routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub token: String,
    pub cron_secret: Option<String>,
}

impl AdminConfig {
    fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let token = match env::var("ADMIN_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingAdminToken)
            }
            _ => DEFAULT_ADMIN_TOKEN.to_string(),
        };

        Ok(Self {
            token,
            cron_secret: env::var("CRON_SECRET")
                .ok()
                .filter(|value| !value.trim().is_empty()),
        })
    }
}

/// Background retry worker cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Seconds between queue runs; zero disables the background worker.
    pub interval_secs: u64,
    pub batch_size: usize,
}

impl QueueConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let interval_secs = env::var("QUEUE_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidQueueInterval)?;

        Ok(Self {
            interval_secs,
            batch_size: 10,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEmail { key: &'static str },
    InvalidRateLimit,
    InvalidMaxAttempts,
    InvalidQueueInterval,
    MissingAdminToken,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEmail { key } => write!(f, "{key} must be a valid email address"),
            ConfigError::InvalidRateLimit => {
                write!(f, "EMAIL_RATE_LIMIT must be a number between 1 and 10000")
            }
            ConfigError::InvalidMaxAttempts => {
                write!(f, "EMAIL_MAX_ATTEMPTS must be a positive integer")
            }
            ConfigError::InvalidQueueInterval => {
                write!(f, "QUEUE_INTERVAL_SECS must be a non-negative integer")
            }
            ConfigError::MissingAdminToken => {
                write!(f, "ADMIN_TOKEN is required in production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
