use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub auth: AuthConfig,

    pub email: EmailConfig,

    pub orders: OrderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    pub log_level: String,

    /// 0 = let tokio pick
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_allowed_origins: vec!["*".to_string()],
            log_level: "info".to_string(),
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "sqlite:platter.db".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret; must be at least 32 bytes outside of tests.
    pub jwt_secret: String,

    /// Session token lifetime in days (also the login cookie horizon).
    pub session_ttl_days: i64,

    /// Password-reset token lifetime in minutes.
    pub reset_ttl_minutes: i64,

    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_ttl_days: 90,
            reset_ttl_minutes: 10,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// When false, notifications are logged instead of sent.
    pub enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_username: String,

    pub smtp_password: String,

    pub from_address: String,

    /// Base URL embedded in password-reset emails.
    pub public_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "Platter <noreply@platter.local>".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Flat surcharge added to every non-self-collection order.
    pub delivery_fee: f64,

    /// Earliest allowed schedule offset from creation, in hours.
    pub min_schedule_hours: i64,

    /// Latest allowed schedule offset from creation, in hours.
    pub max_schedule_hours: i64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            delivery_fee: crate::constants::pricing::DELIVERY_FEE,
            min_schedule_hours: crate::constants::scheduling::MIN_LEAD_HOURS,
            max_schedule_hours: crate::constants::scheduling::MAX_LEAD_HOURS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            orders: OrderConfig::default(),
        }
    }
}

const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Load `config.toml` from the working directory, then apply environment
    /// overrides. Missing file falls back to defaults.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = if Path::new(CONFIG_FILE).exists() {
            let raw = std::fs::read_to_string(CONFIG_FILE)
                .with_context(|| format!("Failed to read {CONFIG_FILE}"))?;
            toml::from_str(&raw).with_context(|| format!("Failed to parse {CONFIG_FILE}"))?
        } else {
            info!("{CONFIG_FILE} not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("PLATTER_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("PLATTER_DATABASE_PATH") {
            self.database.path = url;
        }
        if let Ok(port) = std::env::var("PLATTER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
        if let Ok(password) = std::env::var("PLATTER_SMTP_PASSWORD") {
            self.email.smtp_password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            bail!("auth.jwt_secret must be at least 32 bytes (set PLATTER_JWT_SECRET)");
        }
        if self.auth.session_ttl_days <= 0 {
            bail!("auth.session_ttl_days must be positive");
        }
        if self.auth.reset_ttl_minutes <= 0 {
            bail!("auth.reset_ttl_minutes must be positive");
        }
        if self.orders.delivery_fee < 0.0 {
            bail!("orders.delivery_fee cannot be negative");
        }
        if self.orders.min_schedule_hours >= self.orders.max_schedule_hours {
            bail!("orders.min_schedule_hours must be below max_schedule_hours");
        }
        if self.email.enabled && self.email.smtp_host.is_empty() {
            bail!("email.smtp_host is required when email.enabled = true");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_domain_constants() {
        let config = Config::default();
        assert!((config.orders.delivery_fee - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.orders.min_schedule_hours, 1);
        assert_eq!(config.orders.max_schedule_hours, 6);
        assert_eq!(config.auth.session_ttl_days, 90);
        assert_eq!(config.auth.reset_ttl_minutes, 10);
    }

    #[test]
    fn validate_rejects_short_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_schedule_window() {
        let mut config = Config::default();
        config.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        config.orders.min_schedule_hours = 6;
        config.orders.max_schedule_hours = 1;
        assert!(config.validate().is_err());
    }
}
