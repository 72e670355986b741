// src/config.rs

use std::env;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;

use crate::utils::hash::hash_secret;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Admin token lifetime in seconds.
    pub jwt_expiration: u64,
    /// Argon2 hash of `ADMIN_PASSWORD`. Admin login is disabled while this is unset.
    pub admin_password_hash: Option<String>,
    pub rust_log: String,
    pub port: u16,
    /// Minutes east of UTC used as "local midnight" for week and month windows.
    pub week_utc_offset_minutes: i32,
    /// Optional JSON file replacing the built-in challenge bank.
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let admin_password_hash = env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| hash_secret(&v).expect("ADMIN_PASSWORD could not be hashed"));

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let week_utc_offset_minutes = env::var("WEEK_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);

        let catalog_path = env::var("CATALOG_PATH").ok().map(PathBuf::from);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            admin_password_hash,
            rust_log,
            port,
            week_utc_offset_minutes,
            catalog_path,
        }
    }

    /// The fixed offset that week and month boundaries are anchored to.
    /// Out-of-range values fall back to UTC.
    pub fn week_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.week_utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                tracing::warn!(
                    "WEEK_UTC_OFFSET_MINUTES={} is out of range, using UTC",
                    self.week_utc_offset_minutes
                );
                Utc.fix()
            })
    }

    /// Configuration used by unit and integration tests: in-memory store, known admin password.
    pub fn test_config() -> Self {
        Self {
            database_url: None,
            jwt_secret: "test_secret_for_integration_tests".to_string(),
            jwt_expiration: 600,
            admin_password_hash: hash_secret("admin-pass").ok(),
            rust_log: "error".to_string(),
            port: 0,
            week_utc_offset_minutes: 0,
            catalog_path: None,
        }
    }
}
