use crate::errors::{AppError, Result};
use crate::services::order_status::TransitionPolicy;
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Which persistence adapter the server wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub run_migrations: bool,

  pub jwt_secret: String,
  pub jwt_refresh_secret: String,
  pub access_token_ttl_minutes: i64,
  pub refresh_token_ttl_days: i64,

  pub argon2_memory_kib: u32,
  pub argon2_iterations: u32,

  pub order_transition_policy: TransitionPolicy,

  pub seed_admin_email: Option<String>,
  pub seed_admin_password: Option<String>,
}

const MIN_SECRET_LEN: usize = 32;

/// Parses an optional raw value into `T`, falling back to `default` when unset.
fn parse_or<T>(var_name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: Display,
{
  match raw {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e))),
    None => Ok(default),
  }
}

fn env_or<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: Display,
{
  parse_or(var_name, env::var(var_name).ok(), default)
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "5000".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = match get_env("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string()).as_str() {
      "postgres" => StoreBackend::Postgres,
      "memory" => StoreBackend::Memory,
      other => return Err(AppError::Config(format!("Invalid STORE_BACKEND '{}'", other))),
    };
    let database_url = get_env("DATABASE_URL").ok();
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config("DATABASE_URL is required for the postgres backend".to_string()));
    }
    let db_max_connections = env_or::<u32>("DB_MAX_CONNECTIONS", 10)?;
    let run_migrations = get_env("RUN_MIGRATIONS")
      .unwrap_or_else(|_| "true".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid RUN_MIGRATIONS value: {}", e)))?;

    let jwt_secret = get_env("JWT_SECRET")?;
    let jwt_refresh_secret = get_env("JWT_REFRESH_SECRET")?;

    let order_transition_policy = get_env("ORDER_TRANSITION_POLICY")
      .unwrap_or_else(|_| "permissive".to_string())
      .parse::<TransitionPolicy>()
      .map_err(AppError::Config)?;

    let config = Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      db_max_connections,
      run_migrations,
      jwt_secret,
      jwt_refresh_secret,
      access_token_ttl_minutes: env_or::<i64>("JWT_EXPIRES_IN_MINUTES", 15)?,
      refresh_token_ttl_days: env_or::<i64>("JWT_REFRESH_EXPIRES_IN_DAYS", 7)?,
      argon2_memory_kib: env_or::<u32>("ARGON2_MEMORY_KIB", 19456)?,
      argon2_iterations: env_or::<u32>("ARGON2_ITERATIONS", 2)?,
      order_transition_policy,
      seed_admin_email: get_env("SEED_ADMIN_EMAIL").ok(),
      seed_admin_password: get_env("SEED_ADMIN_PASSWORD").ok(),
    };
    config.validate()?;

    tracing::info!(backend = ?config.store_backend, "Application configuration loaded successfully.");
    Ok(config)
  }

  /// Checks the invariants `from_env` cannot express through parsing alone.
  pub fn validate(&self) -> Result<()> {
    if self.jwt_secret.len() < MIN_SECRET_LEN || self.jwt_refresh_secret.len() < MIN_SECRET_LEN {
      return Err(AppError::Config(format!(
        "JWT_SECRET and JWT_REFRESH_SECRET must be at least {} characters long",
        MIN_SECRET_LEN
      )));
    }
    if self.jwt_secret == self.jwt_refresh_secret {
      return Err(AppError::Config("JWT_SECRET and JWT_REFRESH_SECRET must differ".to_string()));
    }
    if self.access_token_ttl_minutes <= 0 || self.refresh_token_ttl_days <= 0 {
      return Err(AppError::Config("Token lifetimes must be positive".to_string()));
    }
    Ok(())
  }

  /// In-memory configuration with cheap hashing, for tests and local runs.
  pub fn for_memory_store() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      store_backend: StoreBackend::Memory,
      database_url: None,
      db_max_connections: 1,
      run_migrations: false,
      jwt_secret: "access-secret-for-local-runs-0123456789".to_string(),
      jwt_refresh_secret: "refresh-secret-for-local-runs-0123456789".to_string(),
      access_token_ttl_minutes: 15,
      refresh_token_ttl_days: 7,
      argon2_memory_kib: 256,
      argon2_iterations: 1,
      order_transition_policy: TransitionPolicy::Permissive,
      seed_admin_email: None,
      seed_admin_password: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_config_passes_validation() {
    assert!(AppConfig::for_memory_store().validate().is_ok());
  }

  #[test]
  fn identical_secrets_are_rejected() {
    let mut cfg = AppConfig::for_memory_store();
    cfg.jwt_refresh_secret = cfg.jwt_secret.clone();
    assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
  }

  #[test]
  fn short_secret_is_rejected() {
    let mut cfg = AppConfig::for_memory_store();
    cfg.jwt_secret = "short".to_string();
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn numeric_settings_reject_negative_values() {
    assert_eq!(parse_or::<u32>("DB_MAX_CONNECTIONS", None, 10).unwrap(), 10);
    assert_eq!(parse_or::<u32>("DB_MAX_CONNECTIONS", Some(" 8 ".to_string()), 10).unwrap(), 8);
    assert!(matches!(
      parse_or::<u32>("ARGON2_ITERATIONS", Some("-1".to_string()), 2),
      Err(AppError::Config(_))
    ));
  }
}
