// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Token validity when `JWT_EXPIRATION` is unset: seven days.
pub const DEFAULT_JWT_EXPIRATION: u64 = 7 * 24 * 60 * 60;

pub const DEFAULT_PORT: u16 = 5000;

pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| format!("JWT_EXPIRATION must be a number of seconds: {}", e))?,
            Err(_) => DEFAULT_JWT_EXPIRATION,
        };

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| format!("PORT must be a valid port number: {}", e))?,
            Err(_) => DEFAULT_PORT,
        };

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            cors_origins,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }

    /// Configuration used by tests and local tooling: memory store, fixed secret.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            port: 0,
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            admin_email: None,
            admin_password: None,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
