//! Context data carried through each pipeline. Handlers receive these wrapped
//! in `mobileshop_flow::ContextData`.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::requests::{LoginPayload, RegisterPayload};
use crate::models::{Address, CartItem, CartLine, NewOrderLine, OrderDetail, PaymentMethod, Product, User};
use crate::services::token_service::{Claims, TokenPair};
use crate::state::AppState;

pub struct RegisterCtxData {
  pub app_state: AppState,
  pub payload: RegisterPayload,
  pub user: Option<User>,
  pub tokens: Option<TokenPair>,
}

impl RegisterCtxData {
  pub fn new(app_state: AppState, payload: RegisterPayload) -> Self {
    Self {
      app_state,
      payload,
      user: None,
      tokens: None,
    }
  }
}

pub struct LoginCtxData {
  pub app_state: AppState,
  pub payload: LoginPayload,
  pub user: Option<User>,
  pub tokens: Option<TokenPair>,
}

impl LoginCtxData {
  pub fn new(app_state: AppState, payload: LoginPayload) -> Self {
    Self {
      app_state,
      payload,
      user: None,
      tokens: None,
    }
  }
}

pub struct RefreshCtxData {
  pub app_state: AppState,
  pub refresh_token: Option<String>,
  pub claims: Option<Claims>,
  pub user: Option<User>,
  pub tokens: Option<TokenPair>,
}

impl RefreshCtxData {
  pub fn new(app_state: AppState, refresh_token: Option<String>) -> Self {
    Self {
      app_state,
      refresh_token,
      claims: None,
      user: None,
      tokens: None,
    }
  }
}

pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: Option<Product>,
  /// Quantity already in the cart before this request.
  pub existing_quantity: i32,
  pub item: Option<CartItem>,
  /// `true` when this request created the line instead of incrementing it.
  pub created: bool,
}

impl AddToCartCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
    Self {
      app_state,
      user_id,
      product_id,
      quantity,
      product: None,
      existing_quantity: 0,
      item: None,
      created: false,
    }
  }
}

pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub requested_payment_method: Option<String>,
  pub payment_method: PaymentMethod,
  pub address: Option<Address>,
  pub cart_lines: Vec<CartLine>,
  pub order_lines: Vec<NewOrderLine>,
  pub total_amount: Decimal,
  pub order_number: Option<String>,
  pub order_id: Option<Uuid>,
  pub placed_order: Option<OrderDetail>,
}

impl PlaceOrderCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, address_id: Uuid, requested_payment_method: Option<String>) -> Self {
    Self {
      app_state,
      user_id,
      address_id,
      requested_payment_method,
      payment_method: PaymentMethod::default(),
      address: None,
      cart_lines: Vec::new(),
      order_lines: Vec::new(),
      total_amount: Decimal::ZERO,
      order_number: None,
      order_id: None,
      placed_order: None,
    }
  }
}
