use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;

use crate::cors::CorsConfig;
use crate::database::DatabaseConfig;
use crate::error::OrgAuthError;
use crate::utils::get_env_with_prefix;

/// Fallback signing secret used when `JWT_SECRET` is not set.
/// Local development only.
pub const DEFAULT_JWT_SECRET: &str = "$ecret";

/// Main configuration for the orgauth service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    /// Environment keys that were unset and fell back to a built-in default.
    #[serde(skip)]
    pub fallbacks: Vec<&'static str>,
    /// Environment keys whose values did not parse and were ignored.
    #[serde(skip)]
    pub invalid: Vec<&'static str>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Token and cookie settings
#[derive(Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
    /// Mark the `Authorization` cookie `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            fallbacks: Vec::new(),
            invalid: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_seconds: default_token_ttl(),
            cookie_secure: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_ttl() -> u64 {
    3600
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Config {
    /// Emit one warning per setting that is running on its built-in default,
    /// whether it was unset or could not be parsed.
    ///
    /// Called once tracing is installed, since configuration is usually
    /// loaded before the subscriber exists.
    pub fn warn_on_fallbacks(&self) {
        for key in &self.fallbacks {
            match *key {
                "JWT_SECRET" => tracing::warn!(
                    key = *key,
                    "JWT_SECRET not set, using the built-in development secret"
                ),
                "DSN" => tracing::warn!(
                    key = *key,
                    dsn = %self.database.redacted_url(),
                    "DSN not set, using the default connection string"
                ),
                _ => tracing::warn!(key = *key, "Setting not provided, using default"),
            }
        }
        for key in &self.invalid {
            tracing::warn!(key = *key, "Setting could not be parsed, using default");
        }
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database.url = url.into();
        self
    }

    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.config.database = database;
        self
    }

    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.jwt_secret = secret.into();
        self
    }

    pub fn with_token_ttl(mut self, seconds: u64) -> Self {
        self.config.auth.token_ttl_seconds = seconds;
        self
    }

    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.config.auth.cookie_secure = secure;
        self
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.config.cors = cors;
        self
    }

    /// Load configuration from environment variables with ORGAUTH_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        let raw_port = get_env_with_prefix("PORT");
        if raw_port.is_none() {
            self.config.fallbacks.push("PORT");
        }
        if let Some(port) = parse_setting("PORT", raw_port, &mut self.config.invalid) {
            self.config.server.port = port;
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = self.env_setting("LOG_JSON") {
            self.config.logging.json = json;
        }

        match get_env_with_prefix("DSN") {
            Some(dsn) => self.config.database.url = dsn,
            None => self.config.fallbacks.push("DSN"),
        }
        if let Some(timeout) = self.env_setting("DB_QUERY_TIMEOUT_MS") {
            self.config.database.query_timeout_ms = timeout;
        }
        if let Some(attempts) = self.env_setting("DB_CONNECT_ATTEMPTS") {
            self.config.database.connect_attempts = attempts;
        }
        if let Some(seed) = self.env_setting("SEED_DATABASE") {
            self.config.database.seed = seed;
        }

        match get_env_with_prefix("JWT_SECRET") {
            Some(secret) => self.config.auth.jwt_secret = secret,
            None => self.config.fallbacks.push("JWT_SECRET"),
        }
        if let Some(secure) = self.env_setting("COOKIE_SECURE") {
            self.config.auth.cookie_secure = secure;
        }

        self.config.cors = CorsConfig::from_env();

        self
    }

    fn env_setting<T: FromStr>(&mut self, key: &'static str) -> Option<T> {
        parse_setting(key, get_env_with_prefix(key), &mut self.config.invalid)
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid server address (host:port) or port 0
    /// - Invalid log level
    /// - Empty signing secret or zero token TTL
    /// - Zero query timeout or zero connection attempts
    pub fn build(self) -> crate::error::Result<Config> {
        self.config.server.addr().map_err(|e| {
            OrgAuthError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(OrgAuthError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(OrgAuthError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.auth.jwt_secret.is_empty() {
            return Err(OrgAuthError::bad_request("JWT secret must not be empty"));
        }

        if self.config.auth.token_ttl_seconds == 0 {
            return Err(OrgAuthError::bad_request(
                "Token TTL must be greater than 0",
            ));
        }

        if self.config.database.query_timeout_ms == 0 {
            return Err(OrgAuthError::bad_request(
                "Database query timeout must be greater than 0",
            ));
        }

        if self.config.database.connect_attempts == 0 {
            return Err(OrgAuthError::bad_request(
                "Database connect attempts must be greater than 0",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a raw setting, recording `key` in `invalid` when the value does not parse.
fn parse_setting<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    invalid: &mut Vec<&'static str>,
) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            invalid.push(key);
            None
        }
    }
}
