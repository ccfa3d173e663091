//! Process configuration, read once at start-up from environment variables.

use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};

use crate::domain::{CancellationDelivery, EmailConfig};

const DEV_JWT_SECRET: &str = "dev-only-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub environment: Environment,
    pub upload_dir: PathBuf,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
    /// SMTP settings; emails are only logged when absent
    pub email: Option<EmailConfig>,
    pub cancellation_delivery: CancellationDelivery,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = try_load(&lookup, "APP_ENV", "development")?;

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if environment == Environment::Production => {
                bail!("JWT_SECRET must be set in production");
            }
            None => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let email = lookup("EMAIL_CONFIG").and_then(|path| match read_email_config(&path) {
            Ok(config) => {
                info!("Loaded SMTP settings from {}", path);
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring EMAIL_CONFIG {}: {:#}", path, e);
                None
            }
        });

        let await_cancellation: bool = try_load(&lookup, "AWAIT_CANCELLATION_EMAIL", "false")?;

        Ok(Self {
            port: try_load(&lookup, "PORT", "5000")?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite:clubs.db")?,
            jwt_secret,
            token_ttl_hours: try_load(&lookup, "TOKEN_TTL_HOURS", "120")?,
            environment,
            upload_dir: try_load(&lookup, "UPLOAD_DIR", "uploads")?,
            cors_origin: lookup("CORS_ORIGIN").filter(|s| !s.is_empty()),
            email,
            cancellation_delivery: if await_cancellation {
                CancellationDelivery::Awaited
            } else {
                CancellationDelivery::Detached
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}"))
}

fn read_email_config(path: &str) -> Result<EmailConfig> {
    let text = read_to_string(path).with_context(|| format!("reading {}", path))?;
    toml::from_str(&text).context("parsing SMTP settings")
}
