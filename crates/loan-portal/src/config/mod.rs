use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::portal::config::{MessageFanoutPolicy, PortalConfig};

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

/// Top-level configuration for the portal service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalConfig,
    pub seed_demo_data: bool,
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
        let ansi = environment == AppEnvironment::Development;

        let mut portal = PortalConfig::default();
        if let Ok(raw) = env::var("PORTAL_MESSAGE_FANOUT") {
            portal.message_fanout = raw
                .parse::<MessageFanoutPolicy>()
                .map_err(|_| ConfigError::InvalidFanoutPolicy(raw))?;
        }
        if let Ok(raw) = env::var("PORTAL_LOAN_LIMIT_PER_POINT") {
            portal.loan_limit_per_point = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidLoanLimitMultiplier(raw))?;
        }
        if let Ok(raw) = env::var("PORTAL_ENFORCE_LOAN_LIMIT") {
            portal.enforce_loan_limit = parse_flag("PORTAL_ENFORCE_LOAN_LIMIT", &raw)?;
        }

        let seed_demo_data = match env::var("PORTAL_SEED_DEMO_DATA") {
            Ok(raw) => parse_flag("PORTAL_SEED_DEMO_DATA", &raw)?,
            Err(_) => true,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            portal,
            seed_demo_data,
        })
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
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
    pub ansi: bool,
}

/// Raised when an environment variable holds a value the service cannot use.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("PORTAL_MESSAGE_FANOUT must be 'all_staff' or 'first_officer' (found '{0}')")]
    InvalidFanoutPolicy(String),
    #[error("PORTAL_LOAN_LIMIT_PER_POINT must be a non-negative integer (found '{0}')")]
    InvalidLoanLimitMultiplier(String),
    #[error("{name} must be a boolean flag (found '{value}')")]
    InvalidFlag { name: &'static str, value: String },
}
