use crate::config::{AppConfig, StoreBackend};
use crate::db::Repositories;
use crate::errors::{AppError, Result};
use crate::pipelines;
use crate::services::password_service::PasswordService;
use crate::services::token_service::TokenService;
use mobileshop_flow::Registry;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

/// Shared by every request; cheap to clone.
#[derive(Clone)]
pub struct AppState {
  pub repos: Repositories,
  pub flows: Arc<Registry<AppError>>,
  pub tokens: Arc<TokenService>,
  pub passwords: Arc<PasswordService>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the services around `repos` and registers every pipeline.
  pub fn new(config: AppConfig, repos: Repositories) -> Result<Self> {
    let passwords = PasswordService::new(config.argon2_memory_kib, config.argon2_iterations)?;
    let state = Self {
      repos,
      flows: Arc::new(Registry::new()),
      tokens: Arc::new(TokenService::new(&config)),
      passwords: Arc::new(passwords),
      config: Arc::new(config),
    };
    pipelines::register_all_pipelines(&state.flows, &state);
    Ok(state)
  }

  /// Connects the configured backend, running migrations when asked to.
  pub async fn connect(config: AppConfig) -> Result<Self> {
    let repos = match config.store_backend {
      StoreBackend::Memory => {
        info!("Using the in-memory store; data is lost on restart.");
        Repositories::in_memory()
      }
      StoreBackend::Postgres => {
        let url = config
          .database_url
          .as_deref()
          .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
        let pool = PgPoolOptions::new()
          .max_connections(config.db_max_connections)
          .connect(url)
          .await?;
        info!("Successfully connected to the database.");
        if config.run_migrations {
          sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("Database migration failed: {}", e)))?;
          info!("Database migrations applied.");
        }
        Repositories::postgres(pool)
      }
    };
    Self::new(config, repos)
  }
}
