use actix_web::{web, App, HttpServer};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use mobileshop_api::config::AppConfig;
use mobileshop_api::services::admin_service;
use mobileshop_api::state::AppState;
use mobileshop_api::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting MobileShop API server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);

  let app_state = match AppState::connect(app_config).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise application state.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  if let (Some(email), Some(password)) = (
    app_state.config.seed_admin_email.clone(),
    app_state.config.seed_admin_password.clone(),
  ) {
    if let Err(e) = admin_service::seed_admin(&app_state, &email, &password).await {
      tracing::error!(error = %e, "Failed to seed the admin account.");
    }
  }

  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
