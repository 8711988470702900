//! HTTP client for the MobileShop API

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::cart_cache::{CartCache, Invalidation};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::{SessionStore, SessionTokens};
use crate::types::{
  Address, Cart, CartItem, Envelope, NewAddress, Order, OrderPage, Product, ProductPage, RegisterRequest, Session,
  TokenPair, UserProfile,
};

pub struct ApiClient {
  http: Client,
  config: ClientConfig,
  session: SessionStore,
  cart: CartCache,
}

fn to_body<B: Serialize>(body: &B) -> ClientResult<Value> {
  serde_json::to_value(body).map_err(ClientError::from)
}

impl ApiClient {
  pub fn new(config: ClientConfig) -> ClientResult<Self> {
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self {
      http,
      config,
      session: SessionStore::new(),
      cart: CartCache::new(),
    })
  }

  pub fn session(&self) -> &SessionStore {
    &self.session
  }

  pub fn cart_cache(&self) -> &CartCache {
    &self.cart
  }

  /// Sends one request and unwraps the envelope. No retries.
  async fn execute<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<&Value>,
    token: Option<&str>,
  ) -> ClientResult<Envelope<T>> {
    let mut request = self.http.request(method, self.config.url(path));
    if let Some(token) = token {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(body);
    }
    let response = request.send().await?;
    Self::handle_response(response).await
  }

  async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<Envelope<T>> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
      let (code, message) = match serde_json::from_str::<Envelope<Value>>(&text) {
        Ok(envelope) => (envelope.error, envelope.message.unwrap_or_default()),
        Err(_) => (None, text),
      };
      return Err(ClientError::from_failure(status, code.as_deref(), message));
    }

    let envelope: Envelope<T> = serde_json::from_str(&text)?;
    if !envelope.success {
      return Err(ClientError::InvalidResponse(format!(
        "status {} carried success=false",
        status
      )));
    }
    Ok(envelope)
  }

  /// Sends with the current access token. A 401 triggers exactly one refresh
  /// and one retry.
  async fn authorized<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<Value>,
  ) -> ClientResult<Envelope<T>> {
    let token = self.session.access_token().ok_or(ClientError::NotAuthenticated)?;
    match self.execute(method.clone(), path, body.as_ref(), Some(&token)).await {
      Err(ClientError::Unauthorized(reason)) => {
        debug!(%path, %reason, "Access token rejected; refreshing the session.");
        let token = self.refresh_session().await?;
        self.execute(method, path, body.as_ref(), Some(&token)).await
      }
      other => other,
    }
  }

  fn require_data<T>(envelope: Envelope<T>, what: &str) -> ClientResult<T> {
    envelope
      .data
      .ok_or_else(|| ClientError::InvalidResponse(format!("{} response had no data", what)))
  }

  fn end_session(&self) {
    self.session.clear();
    self.cart.invalidate(Invalidation::SessionEnded);
  }

  fn start_session(&self, tokens: TokenPair) {
    self.session.set(SessionTokens {
      access_token: tokens.token,
      refresh_token: tokens.refresh_token,
    });
    self.cart.invalidate(Invalidation::SessionStarted);
  }

  /// Exchanges the stored refresh token for a new pair and returns the new
  /// access token. Any rejection clears the session.
  #[instrument(name = "client::refresh_session", skip(self))]
  pub async fn refresh_session(&self) -> ClientResult<String> {
    let Some(refresh_token) = self.session.refresh_token() else {
      self.end_session();
      return Err(ClientError::SessionExpired);
    };
    let body = json!({ "refreshToken": refresh_token });
    match self.execute::<TokenPair>(Method::POST, "/auth/refresh", Some(&body), None).await {
      Ok(envelope) => {
        let tokens = Self::require_data(envelope, "refresh")?;
        let access_token = tokens.token.clone();
        self.session.set(SessionTokens {
          access_token: tokens.token,
          refresh_token: tokens.refresh_token,
        });
        Ok(access_token)
      }
      Err(ClientError::Http(e)) => Err(ClientError::Http(e)),
      Err(e) => {
        warn!(error = %e, "Session refresh rejected; clearing the session.");
        self.end_session();
        Err(ClientError::SessionExpired)
      }
    }
  }

  // ========== Auth API ==========

  pub async fn register(&self, request: &RegisterRequest) -> ClientResult<UserProfile> {
    let body = to_body(request)?;
    let session: Session = Self::require_data(
      self.execute(Method::POST, "/auth/register", Some(&body), None).await?,
      "register",
    )?;
    self.start_session(session.tokens);
    Ok(session.user)
  }

  #[instrument(name = "client::login", skip(self, password))]
  pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
    let body = json!({ "email": email, "password": password });
    let session: Session = Self::require_data(
      self.execute(Method::POST, "/auth/login", Some(&body), None).await?,
      "login",
    )?;
    self.start_session(session.tokens);
    Ok(session.user)
  }

  /// Ends the session locally even when the server call fails.
  pub async fn logout(&self) -> ClientResult<()> {
    let result = self.authorized::<Value>(Method::POST, "/auth/logout", None).await;
    self.end_session();
    result.map(|_| ())
  }

  pub async fn profile(&self) -> ClientResult<UserProfile> {
    Self::require_data(self.authorized(Method::GET, "/auth/profile", None).await?, "profile")
  }

  // ========== Catalog API ==========

  pub async fn products(&self, page: u32, limit: u32) -> ClientResult<ProductPage> {
    let path = format!("/products?page={}&limit={}", page, limit);
    Self::require_data(self.execute(Method::GET, &path, None, None).await?, "products")
  }

  pub async fn product(&self, id: Uuid) -> ClientResult<Product> {
    let path = format!("/products/{}", id);
    Self::require_data(self.execute(Method::GET, &path, None, None).await?, "product")
  }

  // ========== Cart API ==========

  /// Served from the cache when it holds a cart.
  pub async fn cart(&self) -> ClientResult<Cart> {
    if let Some(cart) = self.cart.get() {
      return Ok(cart);
    }
    let cart: Cart = Self::require_data(self.authorized(Method::GET, "/cart", None).await?, "cart")?;
    self.cart.store(cart.clone());
    Ok(cart)
  }

  pub async fn add_to_cart(&self, product_id: Uuid, quantity: i32) -> ClientResult<CartItem> {
    let body = json!({ "productId": product_id, "quantity": quantity });
    let result = self.authorized(Method::POST, "/cart", Some(body)).await;
    self.cart.invalidate(Invalidation::CartChanged);
    Self::require_data(result?, "add to cart")
  }

  pub async fn update_cart_item(&self, item_id: Uuid, quantity: i32) -> ClientResult<CartItem> {
    let path = format!("/cart/{}", item_id);
    let result = self
      .authorized(Method::PUT, &path, Some(json!({ "quantity": quantity })))
      .await;
    self.cart.invalidate(Invalidation::CartChanged);
    Self::require_data(result?, "update cart item")
  }

  pub async fn remove_cart_item(&self, item_id: Uuid) -> ClientResult<()> {
    let path = format!("/cart/{}", item_id);
    let result = self.authorized::<Value>(Method::DELETE, &path, None).await;
    self.cart.invalidate(Invalidation::CartChanged);
    result.map(|_| ())
  }

  pub async fn clear_cart(&self) -> ClientResult<()> {
    let result = self.authorized::<Value>(Method::DELETE, "/cart", None).await;
    self.cart.invalidate(Invalidation::CartChanged);
    result.map(|_| ())
  }

  // ========== Orders API ==========

  pub async fn place_order(&self, address_id: Uuid) -> ClientResult<Order> {
    let body = json!({ "addressId": address_id, "paymentMethod": "COD" });
    let order: Order = Self::require_data(self.authorized(Method::POST, "/orders", Some(body)).await?, "order")?;
    self.cart.invalidate(Invalidation::OrderPlaced);
    Ok(order)
  }

  pub async fn orders(&self, page: u32) -> ClientResult<OrderPage> {
    let path = format!("/orders?page={}", page);
    Self::require_data(self.authorized(Method::GET, &path, None).await?, "orders")
  }

  pub async fn order(&self, id: Uuid) -> ClientResult<Order> {
    let path = format!("/orders/{}", id);
    Self::require_data(self.authorized(Method::GET, &path, None).await?, "order")
  }

  // ========== Account API ==========

  pub async fn addresses(&self) -> ClientResult<Vec<Address>> {
    Self::require_data(self.authorized(Method::GET, "/users/addresses", None).await?, "addresses")
  }

  pub async fn add_address(&self, address: &NewAddress) -> ClientResult<Address> {
    let body = to_body(address)?;
    Self::require_data(
      self.authorized(Method::POST, "/users/addresses", Some(body)).await?,
      "address",
    )
  }

  pub async fn add_to_wishlist(&self, product_id: Uuid) -> ClientResult<()> {
    let body = json!({ "productId": product_id });
    self.authorized::<Value>(Method::POST, "/users/wishlist", Some(body)).await?;
    Ok(())
  }

  pub async fn remove_from_wishlist(&self, product_id: Uuid) -> ClientResult<()> {
    let path = format!("/users/wishlist/{}", product_id);
    self.authorized::<Value>(Method::DELETE, &path, None).await?;
    Ok(())
  }

  /// Status of the API's health route.
  pub async fn health(&self) -> ClientResult<StatusCode> {
    let response = self.http.get(self.config.url("/health")).send().await?;
    Ok(response.status())
  }
}
