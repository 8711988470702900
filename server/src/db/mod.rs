//! Persistence ports and their adapters.
//!
//! Services and pipelines only see the traits below. `Repositories::postgres`
//! wires the sqlx adapter, `Repositories::in_memory` a process-local one used
//! for development and tests.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
  Address, AddressDraft, Brand, CartItem, CartLine, Category, CustomerRef, CustomerSummary, NewOrder, NewProduct,
  NewUser, Order, OrderDetail, OrderItem, OrderLine, OrderStatus, Page, PageRequest, Product, ProductFilter,
  TaxonomyDraft, User, WishlistEntry, WishlistItem,
};

#[async_trait]
pub trait UserStore: Send + Sync {
  /// Fails with `Conflict` when the e-mail is taken.
  async fn create(&self, new_user: NewUser) -> Result<User>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
  async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn email_exists(&self, email: &str) -> Result<bool>;
  /// Replaces the stored refresh-token digest; `None` ends every session.
  async fn set_refresh_token_hash(&self, id: Uuid, digest: Option<&str>) -> Result<()>;
  /// Persists first name, last name and phone from `user`.
  async fn update_profile(&self, user: &User) -> Result<User>;
  /// Stores a new password hash and clears the refresh-token digest.
  async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
  async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<User>;
  /// Accounts with role USER, newest first, optionally filtered by name or e-mail.
  async fn list_customers(&self, search: Option<&str>, page: PageRequest) -> Result<Page<CustomerSummary>>;
  async fn count_customers(&self) -> Result<i64>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>>;
  /// Looks a product up regardless of its active flag.
  async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>>;
  /// Active products of `category_id` other than `exclude`, newest first.
  async fn related_products(&self, category_id: Uuid, exclude: Uuid, limit: i64) -> Result<Vec<Product>>;
  async fn create_product(&self, new_product: NewProduct) -> Result<Product>;
  async fn update_product(&self, product: &Product) -> Result<Product>;
  async fn deactivate_product(&self, id: Uuid) -> Result<bool>;

  async fn list_categories(&self) -> Result<Vec<Category>>;
  async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;
  async fn create_category(&self, draft: TaxonomyDraft) -> Result<Category>;
  async fn update_category(&self, id: Uuid, draft: TaxonomyDraft) -> Result<Option<Category>>;
  /// Refused with `Conflict` while products reference the category.
  async fn delete_category(&self, id: Uuid) -> Result<bool>;

  async fn list_brands(&self) -> Result<Vec<Brand>>;
  async fn find_brand(&self, id: Uuid) -> Result<Option<Brand>>;
  async fn create_brand(&self, draft: TaxonomyDraft) -> Result<Brand>;
  async fn update_brand(&self, id: Uuid, draft: TaxonomyDraft) -> Result<Option<Brand>>;
  async fn delete_brand(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
  /// The user's cart lines joined with their products, oldest first.
  async fn lines(&self, user_id: Uuid) -> Result<Vec<CartLine>>;
  async fn find_item(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<CartItem>>;
  async fn find_by_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>>;
  /// Inserts a line or increments the existing one for the same product.
  async fn add_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem>;
  async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> Result<CartItem>;
  async fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<bool>;
  async fn clear(&self, user_id: Uuid) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderStats {
  pub total_orders: i64,
  pub pending_orders: i64,
  /// Sum of totals over orders that were not cancelled.
  pub total_revenue: Decimal,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Writes the order and its items, decrements stock conditionally and
  /// empties the user's cart, all or nothing. A line whose stock no longer
  /// covers its quantity aborts with `InsufficientStock`.
  async fn place(&self, new_order: NewOrder) -> Result<Uuid>;
  async fn find(&self, order_id: Uuid) -> Result<Option<Order>>;
  async fn find_detail(&self, order_id: Uuid) -> Result<Option<OrderDetail>>;
  async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> Result<Page<OrderDetail>>;
  async fn list_all(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<OrderDetail>>;
  async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>>;
  async fn stats(&self) -> Result<OrderStats>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
  /// Default address first, then newest.
  async fn list(&self, user_id: Uuid) -> Result<Vec<Address>>;
  async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Address>>;
  /// A default draft clears the user's other defaults in the same write.
  async fn create(&self, user_id: Uuid, draft: AddressDraft) -> Result<Address>;
  async fn update(&self, user_id: Uuid, id: Uuid, draft: AddressDraft) -> Result<Option<Address>>;
  async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
  async fn list(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>>;
  /// Fails with `Conflict` when the product is already listed.
  async fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem>;
  async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct Repositories {
  pub users: Arc<dyn UserStore>,
  pub catalog: Arc<dyn CatalogStore>,
  pub carts: Arc<dyn CartStore>,
  pub orders: Arc<dyn OrderStore>,
  pub addresses: Arc<dyn AddressStore>,
  pub wishlist: Arc<dyn WishlistStore>,
}

impl Repositories {
  pub fn postgres(pool: sqlx::PgPool) -> Self {
    let store = Arc::new(postgres::PgStore::new(pool));
    Self {
      users: store.clone(),
      catalog: store.clone(),
      carts: store.clone(),
      orders: store.clone(),
      addresses: store.clone(),
      wishlist: store,
    }
  }

  pub fn in_memory() -> Self {
    let store = Arc::new(memory::MemoryStore::default());
    Self {
      users: store.clone(),
      catalog: store.clone(),
      carts: store.clone(),
      orders: store.clone(),
      addresses: store.clone(),
      wishlist: store,
    }
  }
}

/// Joins orders with their address, items, products and customer, keeping
/// the order of `orders`. Both adapters hydrate through this.
pub(crate) fn assemble_order_details(
  orders: Vec<Order>,
  items: Vec<OrderItem>,
  products: Vec<Product>,
  addresses: Vec<Address>,
  customers: Vec<CustomerRef>,
) -> Vec<OrderDetail> {
  let products: HashMap<Uuid, Product> = products.into_iter().map(|p| (p.id, p)).collect();
  let addresses: HashMap<Uuid, Address> = addresses.into_iter().map(|a| (a.id, a)).collect();
  let customers: HashMap<Uuid, CustomerRef> = customers.into_iter().map(|c| (c.id, c)).collect();
  let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
  for item in items {
    let product = products.get(&item.product_id).cloned();
    lines_by_order.entry(item.order_id).or_default().push(OrderLine { item, product });
  }

  orders
    .into_iter()
    .map(|order| OrderDetail {
      address: addresses.get(&order.address_id).cloned(),
      items: lines_by_order.remove(&order.id).unwrap_or_default(),
      customer: customers.get(&order.user_id).cloned(),
      order,
    })
    .collect()
}
