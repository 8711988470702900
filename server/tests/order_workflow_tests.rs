mod common;

use common::*;
use mobileshop_api::errors::AppError;
use mobileshop_api::models::requests::AddressUpdatePayload;
use mobileshop_api::models::{Address, OrderDetail, OrderStatus, PageRequest, PaymentMethod};
use mobileshop_api::pipelines::contexts::{AddToCartCtxData, PlaceOrderCtxData};
use mobileshop_api::services::order_status::TransitionPolicy;
use mobileshop_api::services::{account_service, cart_service, catalog_service, order_service};
use mobileshop_api::state::AppState;
use mobileshop_flow::ContextData;
use rust_decimal::Decimal;
use uuid::Uuid;

async fn add_to_cart(state: &AppState, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<bool, AppError> {
  let ctx = ContextData::new(AddToCartCtxData::new(state.clone(), user_id, product_id, quantity));
  state.flows.run(ctx.clone()).await?;
  let created = ctx.read().created;
  Ok(created)
}

async fn place_order(
  state: &AppState,
  user_id: Uuid,
  address_id: Uuid,
  payment_method: Option<&str>,
) -> Result<OrderDetail, AppError> {
  let ctx = ContextData::new(PlaceOrderCtxData::new(
    state.clone(),
    user_id,
    address_id,
    payment_method.map(str::to_string),
  ));
  state.flows.run(ctx.clone()).await?;
  let placed = ctx.read().placed_order.clone();
  Ok(placed.expect("placed order loaded"))
}

async fn order_count(state: &AppState) -> i64 {
  state
    .repos
    .orders
    .list_all(None, PageRequest { page: 1, limit: 100 })
    .await
    .unwrap()
    .total
}

fn default_ids(addresses: &[Address]) -> Vec<Uuid> {
  addresses.iter().filter(|a| a.is_default).map(|a| a.id).collect()
}

fn price(units: i64) -> Decimal {
  Decimal::new(units * 100, 2)
}

#[tokio::test]
async fn adding_the_same_product_twice_sums_into_one_line() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 10).await;
  let (user, _) = register_customer(&state, "cart@example.com").await;

  assert!(add_to_cart(&state, user.id, phone.id, 2).await.unwrap());
  assert!(!add_to_cart(&state, user.id, phone.id, 3).await.unwrap());

  let cart = cart_service::view_cart(&state, user.id).await.unwrap();
  assert_eq!(cart.items.len(), 1);
  assert_eq!(cart.items[0].item.quantity, 5);
  assert_eq!(cart.total_quantity, 5);
}

#[tokio::test]
async fn add_to_cart_guards_quantity_product_and_stock() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 2).await;
  let (user, _) = register_customer(&state, "guard@example.com").await;

  assert!(matches!(
    add_to_cart(&state, user.id, phone.id, 0).await,
    Err(AppError::Validation(_))
  ));
  assert!(matches!(
    add_to_cart(&state, user.id, Uuid::new_v4(), 1).await,
    Err(AppError::NotFound(_))
  ));

  add_to_cart(&state, user.id, phone.id, 2).await.unwrap();
  match add_to_cart(&state, user.id, phone.id, 1).await {
    Err(AppError::InsufficientStock { product }) => assert_eq!(product, "Pixel 9"),
    other => panic!("expected insufficient stock, got {:?}", other),
  }
  let cart = cart_service::view_cart(&state, user.id).await.unwrap();
  assert_eq!(cart.items[0].item.quantity, 2);
}

#[tokio::test]
async fn add_to_cart_near_integer_limit_is_insufficient_stock() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 5).await;
  let (user, _) = register_customer(&state, "limit@example.com").await;

  add_to_cart(&state, user.id, phone.id, 1).await.unwrap();
  assert!(matches!(
    add_to_cart(&state, user.id, phone.id, i32::MAX).await,
    Err(AppError::InsufficientStock { .. })
  ));
  let cart = cart_service::view_cart(&state, user.id).await.unwrap();
  assert_eq!(cart.items.len(), 1);
  assert_eq!(cart.items[0].item.quantity, 1);
}

#[tokio::test]
async fn cart_line_of_a_withdrawn_product_cannot_be_raised() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 5).await;
  let (user, _) = register_customer(&state, "withdrawn@example.com").await;
  add_to_cart(&state, user.id, phone.id, 1).await.unwrap();
  let item_id = cart_service::view_cart(&state, user.id).await.unwrap().items[0].item.id;

  cart_service::update_item(&state, user.id, item_id, 2).await.unwrap();
  catalog_service::delete_product(&state, phone.id).await.unwrap();

  assert!(matches!(
    cart_service::update_item(&state, user.id, item_id, 3).await,
    Err(AppError::NotFound(_))
  ));
  let cart = cart_service::view_cart(&state, user.id).await.unwrap();
  assert_eq!(cart.items[0].item.quantity, 2);
}

#[tokio::test]
async fn placement_on_empty_cart_fails_without_creating_an_order() {
  let state = memory_state();
  let (user, _) = register_customer(&state, "empty@example.com").await;
  let address = add_address(&state, &user, true).await;

  match place_order(&state, user.id, address.id, None).await {
    Err(AppError::Validation(message)) => assert_eq!(message, "Cart is empty"),
    other => panic!("expected an empty-cart rejection, got {:?}", other),
  }
  assert_eq!(order_count(&state).await, 0);
}

#[tokio::test]
async fn placement_rejects_foreign_address_and_other_payment_methods() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 5).await;
  let (user, _) = register_customer(&state, "mine@example.com").await;
  let (other, _) = register_customer(&state, "theirs@example.com").await;
  let own_address = add_address(&state, &user, true).await;
  let foreign_address = add_address(&state, &other, true).await;
  add_to_cart(&state, user.id, phone.id, 1).await.unwrap();

  match place_order(&state, user.id, foreign_address.id, None).await {
    Err(AppError::Validation(message)) => assert_eq!(message, "Invalid address"),
    other => panic!("expected an address rejection, got {:?}", other),
  }
  assert!(matches!(
    place_order(&state, user.id, own_address.id, Some("CARD")).await,
    Err(AppError::Validation(_))
  ));
  assert_eq!(order_count(&state).await, 0);
}

#[tokio::test]
async fn placement_over_stock_changes_nothing() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let plenty = seed_product(&state, &taxonomy, "Galaxy S24", price(650), None, 10).await;
  let scarce = seed_product(&state, &taxonomy, "Pixel Fold", price(1500), None, 3).await;
  let (user, _) = register_customer(&state, "oversell@example.com").await;
  let address = add_address(&state, &user, true).await;
  add_to_cart(&state, user.id, plenty.id, 2).await.unwrap();
  add_to_cart(&state, user.id, scarce.id, 3).await.unwrap();

  // Someone else bought the last units after the line was added.
  let mut restocked = scarce.clone();
  restocked.stock = 1;
  state.repos.catalog.update_product(&restocked).await.unwrap();

  match place_order(&state, user.id, address.id, Some("COD")).await {
    Err(AppError::InsufficientStock { product }) => assert_eq!(product, "Pixel Fold"),
    other => panic!("expected insufficient stock, got {:?}", other),
  }
  assert_eq!(order_count(&state).await, 0);
  let plenty_after = state.repos.catalog.find_product(plenty.id).await.unwrap().unwrap();
  assert_eq!(plenty_after.stock, 10);
  assert_eq!(cart_service::view_cart(&state, user.id).await.unwrap().items.len(), 2);
}

#[tokio::test]
async fn successful_placement_prices_lines_and_consumes_the_cart() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let discounted = seed_product(&state, &taxonomy, "Pixel 9", price(700), Some(price(650)), 5).await;
  let full_price = seed_product(&state, &taxonomy, "Pixel Buds", price(200), None, 4).await;
  let (user, _) = register_customer(&state, "buyer@example.com").await;
  let address = add_address(&state, &user, true).await;
  add_to_cart(&state, user.id, discounted.id, 2).await.unwrap();
  add_to_cart(&state, user.id, full_price.id, 1).await.unwrap();

  let placed = place_order(&state, user.id, address.id, None).await.unwrap();

  assert_eq!(placed.order.total_amount, price(650 * 2 + 200));
  assert_eq!(placed.order.status, OrderStatus::Pending);
  assert_eq!(placed.order.payment_method, PaymentMethod::Cod);
  assert!(placed.order.order_number.starts_with("ORD-"));
  assert_eq!(placed.items.len(), 2);
  assert_eq!(placed.address.as_ref().map(|a| a.id), Some(address.id));
  assert_eq!(placed.customer.as_ref().map(|c| c.id), Some(user.id));

  let discounted_after = state.repos.catalog.find_product(discounted.id).await.unwrap().unwrap();
  let full_after = state.repos.catalog.find_product(full_price.id).await.unwrap().unwrap();
  assert_eq!(discounted_after.stock, 3);
  assert_eq!(full_after.stock, 3);
  assert!(cart_service::view_cart(&state, user.id).await.unwrap().items.is_empty());

  let own = order_service::get_own(&state, user.id, placed.order.id).await.unwrap();
  assert_eq!(own.order.order_number, placed.order.order_number);
}

#[tokio::test]
async fn address_used_by_an_order_cannot_be_deleted() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 5).await;
  let (user, _) = register_customer(&state, "keeper@example.com").await;
  let shipped_to = add_address(&state, &user, true).await;
  let spare = add_address(&state, &user, false).await;
  add_to_cart(&state, user.id, phone.id, 1).await.unwrap();
  let placed = place_order(&state, user.id, shipped_to.id, None).await.unwrap();

  assert!(matches!(
    account_service::delete_address(&state, user.id, shipped_to.id).await,
    Err(AppError::Conflict(_))
  ));
  account_service::delete_address(&state, user.id, spare.id).await.unwrap();

  let own = order_service::get_own(&state, user.id, placed.order.id).await.unwrap();
  assert_eq!(own.address.map(|a| a.id), Some(shipped_to.id));
}

#[tokio::test]
async fn orders_of_other_users_read_as_missing() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 5).await;
  let (user, _) = register_customer(&state, "owner@example.com").await;
  let (snoop, _) = register_customer(&state, "snoop@example.com").await;
  let address = add_address(&state, &user, true).await;
  add_to_cart(&state, user.id, phone.id, 1).await.unwrap();
  let placed = place_order(&state, user.id, address.id, None).await.unwrap();

  let err = order_service::get_own(&state, snoop.id, placed.order.id).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn permissive_policy_allows_any_move() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 5).await;
  let (user, _) = register_customer(&state, "any@example.com").await;
  let address = add_address(&state, &user, true).await;
  add_to_cart(&state, user.id, phone.id, 1).await.unwrap();
  let placed = place_order(&state, user.id, address.id, None).await.unwrap();

  let delivered = order_service::set_status(&state, placed.order.id, "DELIVERED").await.unwrap();
  assert_eq!(delivered.status, OrderStatus::Delivered);
  let back = order_service::set_status(&state, placed.order.id, "PENDING").await.unwrap();
  assert_eq!(back.status, OrderStatus::Pending);
  assert!(matches!(
    order_service::set_status(&state, placed.order.id, "RETURNED").await,
    Err(AppError::Validation(_))
  ));
  assert!(matches!(
    order_service::set_status(&state, Uuid::new_v4(), "SHIPPED").await,
    Err(AppError::NotFound(_))
  ));
}

#[tokio::test]
async fn lifecycle_policy_rejects_illegal_moves() {
  let state = state_with_policy(TransitionPolicy::Lifecycle);
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", price(700), None, 5).await;
  let (user, _) = register_customer(&state, "strict@example.com").await;
  let address = add_address(&state, &user, true).await;
  add_to_cart(&state, user.id, phone.id, 1).await.unwrap();
  let placed = place_order(&state, user.id, address.id, None).await.unwrap();
  let id = placed.order.id;

  assert!(matches!(
    order_service::set_status(&state, id, "DELIVERED").await,
    Err(AppError::Validation(_))
  ));
  order_service::set_status(&state, id, "CONFIRMED").await.unwrap();
  order_service::set_status(&state, id, "SHIPPED").await.unwrap();
  order_service::set_status(&state, id, "DELIVERED").await.unwrap();
  assert!(matches!(
    order_service::set_status(&state, id, "CANCELLED").await,
    Err(AppError::Validation(_))
  ));
}

#[tokio::test]
async fn only_one_default_address_per_user() {
  let state = memory_state();
  let (user, _) = register_customer(&state, "home@example.com").await;
  let first = add_address(&state, &user, true).await;
  let second = add_address(&state, &user, true).await;
  let third = add_address(&state, &user, false).await;

  let listed = account_service::list_addresses(&state, user.id).await.unwrap();
  assert_eq!(default_ids(&listed), vec![second.id]);
  assert_eq!(listed[0].id, second.id);

  account_service::update_address(
    &state,
    user.id,
    third.id,
    AddressUpdatePayload {
      is_default: Some(true),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  let listed = account_service::list_addresses(&state, user.id).await.unwrap();
  assert_eq!(default_ids(&listed), vec![third.id]);
  assert!(listed.iter().any(|a| a.id == first.id && !a.is_default));
}
