//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use crate::ServerConfig;
use crate::db::Database;
use clap::Parser;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

const JWT_SECRET_ENV: &str = "JWT_SECRET";
const POLKA_KEY_ENV: &str = "POLKA_KEY";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "chirpauth", about = "Credential service for Chirpy")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "chirpy.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Path to file containing the Polka webhook API key. Prefer using POLKA_KEY env var instead
    #[arg(long)]
    pub polka_key_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value = "3600", value_parser = clap::value_parser!(u64).range(1..))]
    pub access_token_ttl: u64,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Read a secret from an environment variable, falling back to a file.
/// The environment variable is cleared once read.
fn load_secret(env_var: &str, file: Option<&str>, flag: &str) -> Option<String> {
    if let Ok(secret) = std::env::var(env_var) {
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        return Some(secret);
    }

    let Some(path) = file else {
        error!(
            "{} is required. Set the {} environment variable (recommended) or use {}",
            env_var, env_var, flag
        );
        return None;
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.trim().to_string()),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read secret file");
            None
        }
    }
}

fn check_jwt_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }
    Some(secret)
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    load_secret(JWT_SECRET_ENV, jwt_secret_file, "--jwt-secret-file").and_then(check_jwt_secret)
}

/// Load the webhook API key from environment variable or file.
pub fn load_polka_key(polka_key_file: Option<&str>) -> Option<String> {
    let key = load_secret(POLKA_KEY_ENV, polka_key_file, "--polka-key-file")?;
    if key.is_empty() {
        error!("Polka API key is empty");
        return None;
    }
    Some(key)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    polka_key: String,
    access_token_ttl_secs: u64,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        polka_key,
        access_token_ttl: Duration::from_secs(access_token_ttl_secs),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
