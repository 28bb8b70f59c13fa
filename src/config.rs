use std::env;

use crate::constants::{DEFAULT_TOKEN_EXPIRY_SECS, DEV_JWT_SECRET};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub jwt_secret: String,
    pub token_expiry_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| "Invalid PORT")?;

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "./data/drill-tracker.redb".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5000,http://127.0.0.1:5000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment == "production" => {
                return Err("JWT_SECRET must be set in production".to_string());
            }
            _ => {
                tracing::warn!("JWT_SECRET not set, using development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let token_expiry_secs = env::var("TOKEN_EXPIRY_SECS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_EXPIRY_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid TOKEN_EXPIRY_SECS")?;

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            jwt_secret,
            token_expiry_secs,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Whether raw internal error messages may be returned to clients
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
