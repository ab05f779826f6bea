use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub bcrypt_cost: u32,
    pub password_min_length: usize,
    pub max_upload_bytes: usize,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone)]
pub enum StorageSettings {
    Local { media_root: PathBuf },
    S3(S3Settings),
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match optional_env("STORAGE_BACKEND")
            .unwrap_or_else(|| "local".to_string())
            .as_str()
        {
            "local" => StorageSettings::Local {
                media_root: optional_env("MEDIA_ROOT")
                    .unwrap_or_else(|| "./media".to_string())
                    .into(),
            },
            "s3" => StorageSettings::S3(S3Settings {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        let bcrypt_cost = parse_env("BCRYPT_COST", optional_env("BCRYPT_COST"), 12u32)?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: parse_env("PORT", optional_env("PORT"), 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            db_max_connections: parse_env(
                "DB_MAX_CONNECTIONS",
                optional_env("DB_MAX_CONNECTIONS"),
                10,
            )?,
            run_migrations: parse_bool(
                "RUN_MIGRATIONS",
                optional_env("RUN_MIGRATIONS"),
                true,
            )?,
            access_token_ttl_secs: parse_env(
                "ACCESS_TOKEN_TTL_SECS",
                optional_env("ACCESS_TOKEN_TTL_SECS"),
                300,
            )?,
            refresh_token_ttl_secs: parse_env(
                "REFRESH_TOKEN_TTL_SECS",
                optional_env("REFRESH_TOKEN_TTL_SECS"),
                86_400,
            )?,
            bcrypt_cost,
            password_min_length: parse_env(
                "PASSWORD_MIN_LENGTH",
                optional_env("PASSWORD_MIN_LENGTH"),
                8,
            )?,
            max_upload_bytes: parse_env(
                "MAX_UPLOAD_BYTES",
                optional_env("MAX_UPLOAD_BYTES"),
                10 * 1024 * 1024,
            )?,
            storage,
        })
    }

    /// Settings for unit tests: fast hashing, local storage under `media_root`.
    #[cfg(test)]
    pub fn for_tests(media_root: PathBuf) -> Self {
        Config {
            database_url: "postgres://unused".to_string(),
            jwt_secret: "test-secret-key-for-unit-tests".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            db_max_connections: 1,
            run_migrations: false,
            access_token_ttl_secs: 300,
            refresh_token_ttl_secs: 86_400,
            bcrypt_cost: 4,
            password_min_length: 8,
            max_upload_bytes: 1024 * 1024,
            storage: StorageSettings::Local { media_root },
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{value}': {e}")),
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => bail!("{key} must be a boolean, got '{v}'"),
    }
}
