mod common;

use std::str::FromStr;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::*;
use mobileshop_api::state::AppState;
use mobileshop_api::web::configure_app_routes;
use rust_decimal::Decimal;
use serde_json::{json, Value};

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn decimal(value: &Value) -> Decimal {
  Decimal::from_str(value.as_str().expect("decimals travel as strings")).expect("valid decimal")
}

fn register_body(email: &str) -> Value {
  json!({
    "email": email,
    "password": PASSWORD,
    "firstName": "Ravi",
    "lastName": "Menon",
    "phone": "9000000000"
  })
}

async fn stock_of(state: &AppState, product_id: uuid::Uuid) -> i32 {
  state.repos.catalog.find_product(product_id).await.unwrap().unwrap().stock
}

#[actix_web::test]
async fn health_answers_inside_the_envelope() {
  let state = memory_state();
  let app = init_app!(state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "success": true, "data": { "status": "ok" } }));
}

#[actix_web::test]
async fn session_responses_never_carry_secrets() {
  let state = memory_state();
  let app = init_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/auth/register")
    .set_json(register_body("ravi@example.com"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "User registered successfully");
  assert_eq!(body["data"]["user"]["email"], "ravi@example.com");
  assert_eq!(body["data"]["user"]["role"], "USER");
  assert!(body["data"]["token"].is_string());
  assert!(body["data"]["refreshToken"].is_string());
  let raw = body.to_string();
  assert!(!raw.contains("passwordHash") && !raw.contains("argon2"));

  let token = body["data"]["token"].as_str().unwrap().to_string();
  let req = test::TestRequest::get()
    .uri("/api/auth/profile")
    .insert_header(("Authorization", format!("Bearer {}", token)))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["data"]["firstName"], "Ravi");
  assert!(!body.to_string().contains("argon2"));
}

#[actix_web::test]
async fn malformed_input_is_a_bad_request_envelope() {
  let state = memory_state();
  let app = init_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/auth/login")
    .insert_header(("Content-Type", "application/json"))
    .set_payload("{\"email\": ")
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], false);
  assert_eq!(body["error"], "BAD_REQUEST");

  let resp = test::call_service(
    &app,
    test::TestRequest::get().uri("/api/products/not-a-uuid").to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = test::call_service(
    &app,
    test::TestRequest::get().uri("/api/products?limit=500").to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn admin_routes_require_an_admin_token() {
  let state = memory_state();
  let (_, customer) = register_customer(&state, "plain@example.com").await;
  let (_, admin) = seed_admin(&state).await;
  let app = init_app!(state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/admin/dashboard").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "UNAUTHORIZED");

  let req = test::TestRequest::get()
    .uri("/api/admin/dashboard")
    .insert_header(bearer(&customer))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  for uri in ["/api/admin/orders", "/api/admin/users"] {
    let req = test::TestRequest::get().uri(uri).insert_header(bearer(&customer)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "FORBIDDEN");
  }

  let req = test::TestRequest::post()
    .uri("/api/categories")
    .insert_header(bearer(&customer))
    .set_json(json!({ "name": "Tablets" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::get()
    .uri("/api/admin/dashboard")
    .insert_header(bearer(&admin))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["totalUsers"], 1);
}

#[actix_web::test]
async fn refresh_token_is_not_an_access_token() {
  let state = memory_state();
  let (_, tokens) = register_customer(&state, "mixup@example.com").await;
  let app = init_app!(state);

  let req = test::TestRequest::get()
    .uri("/api/cart")
    .insert_header(("Authorization", format!("Bearer {}", tokens.refresh_token)))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn product_listing_is_paginated() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  for n in 0..3 {
    seed_product(&state, &taxonomy, &format!("Phone {}", n), Decimal::new(10_000 + n, 2), None, 5).await;
  }
  let app = init_app!(state);

  let req = test::TestRequest::get().uri("/api/products?limit=2&sortBy=price&sortOrder=asc").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["data"]["products"].as_array().unwrap().len(), 2);
  assert_eq!(body["data"]["products"][0]["name"], "Phone 0");
  assert_eq!(
    body["data"]["pagination"],
    json!({ "page": 1, "limit": 2, "total": 3, "pages": 2 })
  );
}

#[actix_web::test]
async fn product_discount_can_be_cleared() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", Decimal::new(70_000, 2), Some(Decimal::new(65_000, 2)), 5).await;
  let (_, admin) = seed_admin(&state).await;
  let app = init_app!(state);
  let uri = format!("/api/products/{}", phone.id);

  let req = test::TestRequest::put()
    .uri(&uri)
    .insert_header(bearer(&admin))
    .set_json(json!({ "stock": 7 }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(decimal(&body["data"]["discountPrice"]), Decimal::new(65_000, 2));
  assert_eq!(body["data"]["stock"], 7);

  let req = test::TestRequest::put()
    .uri(&uri)
    .insert_header(bearer(&admin))
    .set_json(json!({ "discountPrice": null }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["success"], true);
  assert!(body["data"]["discountPrice"].is_null());

  let stored = state.repos.catalog.find_product(phone.id).await.unwrap().unwrap();
  assert_eq!(stored.discount_price, None);
  assert_eq!(stored.effective_price(), Decimal::new(70_000, 2));
}

/// Register, shop, check out, then let the admin ship and deliver.
#[actix_web::test]
async fn storefront_end_to_end() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", Decimal::new(70_000, 2), None, 2).await;
  let (_, admin) = seed_admin(&state).await;
  let app = init_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/auth/register")
    .set_json(register_body("e2e@example.com"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  let req = test::TestRequest::post()
    .uri("/api/auth/login")
    .set_json(json!({ "email": "e2e@example.com", "password": PASSWORD }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let auth = ("Authorization", format!("Bearer {}", body["data"]["token"].as_str().unwrap()));

  let req = test::TestRequest::post()
    .uri("/api/users/addresses")
    .insert_header(auth.clone())
    .set_json(json!({
      "fullName": "Ravi Menon",
      "phone": "9000000000",
      "addressLine1": "4 Park Street",
      "city": "Kolkata",
      "state": "West Bengal",
      "postalCode": "700016",
      "isDefault": true
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["country"], "India");
  let address_id = body["data"]["id"].as_str().unwrap().to_string();

  for expected in [StatusCode::CREATED, StatusCode::OK] {
    let req = test::TestRequest::post()
      .uri("/api/cart")
      .insert_header(auth.clone())
      .set_json(json!({ "productId": phone.id }))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), expected);
  }

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(auth.clone())
    .set_json(json!({ "addressId": address_id, "paymentMethod": "COD" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let order = &body["data"];
  assert_eq!(decimal(&order["totalAmount"]), Decimal::new(140_000, 2));
  assert_eq!(order["status"], "PENDING");
  assert_eq!(order["items"][0]["quantity"], 2);
  let order_id = order["id"].as_str().unwrap().to_string();
  assert_eq!(stock_of(&state, phone.id).await, 0);

  let req = test::TestRequest::get().uri("/api/cart").insert_header(auth.clone()).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert!(body["data"]["items"].as_array().unwrap().is_empty());

  // Nothing left on the shelf.
  let req = test::TestRequest::post()
    .uri("/api/cart")
    .insert_header(auth.clone())
    .set_json(json!({ "productId": phone.id, "quantity": 1 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "INSUFFICIENT_STOCK");
  let req = test::TestRequest::get().uri("/api/cart").insert_header(auth.clone()).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert!(body["data"]["items"].as_array().unwrap().is_empty());

  for status in ["SHIPPED", "DELIVERED"] {
    let req = test::TestRequest::put()
      .uri(&format!("/api/admin/orders/{}/status", order_id))
      .insert_header(bearer(&admin))
      .set_json(json!({ "status": status }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], status);
  }

  let req = test::TestRequest::get()
    .uri(&format!("/api/orders/{}", order_id))
    .insert_header(auth)
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["data"]["status"], "DELIVERED");
}

#[actix_web::test]
async fn wishlist_add_remove_and_duplicates() {
  let state = memory_state();
  let taxonomy = seed_taxonomy(&state).await;
  let phone = seed_product(&state, &taxonomy, "Pixel 9", Decimal::new(70_000, 2), None, 2).await;
  let (_, tokens) = register_customer(&state, "wish@example.com").await;
  let app = init_app!(state);

  let add = || {
    test::TestRequest::post()
      .uri("/api/users/wishlist")
      .insert_header(bearer(&tokens))
      .set_json(json!({ "productId": phone.id }))
      .to_request()
  };
  assert_eq!(test::call_service(&app, add()).await.status(), StatusCode::CREATED);
  assert_eq!(test::call_service(&app, add()).await.status(), StatusCode::CONFLICT);

  let remove = || {
    test::TestRequest::delete()
      .uri(&format!("/api/users/wishlist/{}", phone.id))
      .insert_header(bearer(&tokens))
      .to_request()
  };
  assert_eq!(test::call_service(&app, remove()).await.status(), StatusCode::OK);
  assert_eq!(test::call_service(&app, remove()).await.status(), StatusCode::NOT_FOUND);
}
