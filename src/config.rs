//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `CORKBOARD_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `CORKBOARD_` override YAML values
//! 3. **DATABASE_PATH** - Special case: overrides `database.path` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `CORKBOARD_AUTH__SESSION__COOKIE_SECURE=false` sets the `auth.session.cookie_secure` field.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Database**: `database.path` - SQLite database file (`:memory:` for ephemeral)
//! - **Security**: `secret_key` - HMAC key for the anti-forgery cookie (required)
//! - **Authentication**: `auth.session`, `auth.csrf`, `auth.password` - session windows,
//!   cookie attributes and password policy
//! - **CORS**: `cors.allowed_origins` - browser origins allowed to call the API

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CORKBOARD_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded from YAML and environment variables. All fields have defaults except
/// `secret_key`, which must be provided before the server will start.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// SQLite database file path override via environment variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Secret key for signing the anti-forgery cookie (required)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: None,
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests (`*` allows all origins)
    pub allowed_origins: Vec<String>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // Development frontend (Vite)
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file path; `:memory:` gives an ephemeral in-process database
    pub path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "corkboard.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Session lifetime and cookie settings
    pub session: SessionConfig,
    /// Anti-forgery token settings
    pub csrf: CsrfConfig,
    /// Password policy for sign-up and credential verification
    pub password: PasswordConfig,
}

/// Session window and cookie settings.
///
/// A session is valid for `active_period + idle_period` in total: during the
/// active period it is honored without any server-side mutation; during the
/// idle period the next presentation renews both windows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Duration after issuance/renewal during which no renewal is needed
    #[serde(with = "humantime_serde")]
    pub active_period: Duration,
    /// Duration after the active period during which a presented session is renewed
    #[serde(with = "humantime_serde")]
    pub idle_period: Duration,
    /// Cookie name for the session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active_period: Duration::from_secs(24 * 60 * 60), // 1 day
            idle_period: Duration::from_secs(24 * 60 * 60),   // 1 day
            cookie_name: "corkboard_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "lax".to_string(),
        }
    }
}

/// Anti-forgery (double-submit) token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsrfConfig {
    /// Cookie carrying the signed token
    pub cookie_name: String,
    /// Request header the client echoes the token back in
    pub header_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie_name: "corkboard_csrf".to_string(),
            header_name: "x-csrf-token".to_string(),
        }
    }
}

/// Password length policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 50,
        }
    }
}

impl Config {
    fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("CORKBOARD_").split("__"))
    }

    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_PATH wins over the nested database.path setting
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = Some(path);
        }
        if let Some(path) = config.database_path.take() {
            config.database.path = path;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let Some(secret) = self.secret_key.as_deref() else {
            return Err("secret_key is required (set CORKBOARD_SECRET_KEY or secret_key in config.yaml)".to_string());
        };
        if secret.len() < 32 {
            return Err("secret_key must be at least 32 bytes".to_string());
        }
        if self.auth.session.active_period.is_zero() || self.auth.session.idle_period.is_zero() {
            return Err("auth.session periods must be non-zero".to_string());
        }
        match self.auth.session.cookie_same_site.to_ascii_lowercase().as_str() {
            "strict" | "lax" | "none" => {}
            other => return Err(format!("invalid auth.session.cookie_same_site value: {other}")),
        }
        if self.auth.password.min_length == 0 || self.auth.password.min_length > self.auth.password.max_length {
            return Err("invalid auth.password length policy".to_string());
        }
        if self.cors.allowed_origins.is_empty() {
            return Err("cors.allowed_origins cannot be empty".to_string());
        }
        // A wildcard origin is incompatible with credentialed requests
        if self.cors.allow_credentials && self.cors.allowed_origins.iter().any(|origin| origin == "*") {
            return Err("cors cannot use the wildcard origin '*' with allow_credentials=true".to_string());
        }
        Ok(())
    }
}
