#![allow(dead_code)]

use std::collections::BTreeMap;

use mobileshop_api::config::AppConfig;
use mobileshop_api::db::Repositories;
use mobileshop_api::models::requests::{AddressPayload, ProductPayload, RegisterPayload, TaxonomyPayload};
use mobileshop_api::models::{Address, Brand, Category, Product, User};
use mobileshop_api::pipelines::contexts::RegisterCtxData;
use mobileshop_api::services::order_status::TransitionPolicy;
use mobileshop_api::services::token_service::TokenPair;
use mobileshop_api::services::{account_service, admin_service, auth_service, catalog_service};
use mobileshop_api::state::AppState;
use mobileshop_flow::ContextData;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tracing::Level;

pub const PASSWORD: &str = "Str0ng!pass";
pub const ADMIN_EMAIL: &str = "admin@mobileshop.test";

static TRACING: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

pub fn memory_state() -> AppState {
  state_with_policy(TransitionPolicy::Permissive)
}

pub fn state_with_policy(policy: TransitionPolicy) -> AppState {
  setup_tracing();
  let mut config = AppConfig::for_memory_store();
  config.order_transition_policy = policy;
  AppState::new(config, Repositories::in_memory()).expect("memory state builds")
}

pub fn register_payload(email: &str) -> RegisterPayload {
  RegisterPayload {
    email: email.to_string(),
    password: PASSWORD.to_string(),
    first_name: "Asha".to_string(),
    last_name: "Rao".to_string(),
    phone: None,
  }
}

/// Registers a customer through the register pipeline.
pub async fn register_customer(state: &AppState, email: &str) -> (User, TokenPair) {
  let ctx = ContextData::new(RegisterCtxData::new(state.clone(), register_payload(email)));
  state.flows.run(ctx.clone()).await.expect("registration succeeds");
  let guard = ctx.read();
  (
    guard.user.clone().expect("user created"),
    guard.tokens.clone().expect("tokens issued"),
  )
}

pub async fn seed_admin(state: &AppState) -> (User, TokenPair) {
  admin_service::seed_admin(state, ADMIN_EMAIL, PASSWORD).await.expect("admin seeded");
  let admin = state
    .repos
    .users
    .find_by_email(ADMIN_EMAIL)
    .await
    .unwrap()
    .expect("admin stored");
  let tokens = auth_service::start_session(state, &admin).await.expect("admin session");
  (admin, tokens)
}

pub async fn seed_taxonomy(state: &AppState) -> (Category, Brand) {
  let category = catalog_service::create_category(
    state,
    TaxonomyPayload {
      name: Some("Smartphones".to_string()),
      description: Some("Phones of every size".to_string()),
      image: None,
    },
  )
  .await
  .expect("category created");
  let brand = catalog_service::create_brand(
    state,
    TaxonomyPayload {
      name: Some("Pixel".to_string()),
      description: None,
      image: None,
    },
  )
  .await
  .expect("brand created");
  (category, brand)
}

pub async fn seed_product(
  state: &AppState,
  taxonomy: &(Category, Brand),
  name: &str,
  price: Decimal,
  discount_price: Option<Decimal>,
  stock: i32,
) -> Product {
  catalog_service::create_product(
    state,
    ProductPayload {
      name: name.to_string(),
      description: format!("{} with an all-day battery", name),
      price,
      discount_price,
      stock,
      category_id: taxonomy.0.id,
      brand_id: taxonomy.1.id,
      images: vec!["https://cdn.mobileshop.test/phone.png".to_string()],
      specifications: BTreeMap::from([("ram".to_string(), "8GB".to_string())]),
    },
  )
  .await
  .expect("product created")
}

pub fn address_payload(is_default: bool) -> AddressPayload {
  AddressPayload {
    full_name: "Asha Rao".to_string(),
    phone: "9876543210".to_string(),
    address_line1: "12 MG Road".to_string(),
    address_line2: None,
    city: "Bengaluru".to_string(),
    state: "Karnataka".to_string(),
    postal_code: "560001".to_string(),
    country: None,
    is_default,
  }
}

pub async fn add_address(state: &AppState, user: &User, is_default: bool) -> Address {
  account_service::create_address(state, user.id, address_payload(is_default))
    .await
    .expect("address created")
}

pub fn bearer(tokens: &TokenPair) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", tokens.token))
}
