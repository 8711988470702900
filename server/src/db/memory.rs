//! Process-local adapter. Every port method takes the single lock once, so
//! multi-row writes such as order placement are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
  assemble_order_details, AddressStore, CartStore, CatalogStore, OrderStats, OrderStore, UserStore, WishlistStore,
};
use crate::errors::{AppError, Result};
use crate::models::{
  Address, AddressDraft, Brand, CartItem, CartLine, Category, CustomerRef, CustomerSummary, NewOrder, NewProduct,
  NewUser, Order, OrderDetail, OrderItem, OrderStatus, Page, PageRequest, Product, ProductFilter, ProductSort,
  Role, SortOrder, TaxonomyDraft, User, WishlistEntry, WishlistItem,
};

#[derive(Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  categories: HashMap<Uuid, Category>,
  brands: HashMap<Uuid, Brand>,
  products: HashMap<Uuid, Product>,
  cart_items: Vec<CartItem>,
  /// Insertion order doubles as creation order.
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  addresses: Vec<Address>,
  wishlist: Vec<WishlistItem>,
}

impl Tables {
  fn slug_taken<'a>(mut slugs: impl Iterator<Item = (&'a Uuid, &'a str)>, slug: &str, except: Option<Uuid>) -> bool {
    slugs.any(|(id, s)| s == slug && Some(*id) != except)
  }

  fn details(&self, orders: Vec<Order>) -> Vec<OrderDetail> {
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items: Vec<OrderItem> = self
      .order_items
      .iter()
      .filter(|i| order_ids.contains(&i.order_id))
      .cloned()
      .collect();
    let products = items
      .iter()
      .filter_map(|i| self.products.get(&i.product_id).cloned())
      .collect();
    let addresses = orders
      .iter()
      .filter_map(|o| self.addresses.iter().find(|a| a.id == o.address_id).cloned())
      .collect();
    let customers = orders
      .iter()
      .filter_map(|o| self.users.get(&o.user_id))
      .map(|u| CustomerRef {
        id: u.id,
        email: u.email.clone(),
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
        phone: u.phone.clone(),
      })
      .collect();
    assemble_order_details(orders, items, products, addresses, customers)
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

#[async_trait]
impl UserStore for MemoryStore {
  async fn create(&self, new_user: NewUser) -> Result<User> {
    let mut tables = self.tables.lock();
    if tables.users.values().any(|u| u.email == new_user.email) {
      return Err(AppError::Conflict("An account with this email already exists.".to_string()));
    }
    let now = Utc::now();
    let user = User {
      id: Uuid::new_v4(),
      email: new_user.email,
      password_hash: new_user.password_hash,
      first_name: new_user.first_name,
      last_name: new_user.last_name,
      phone: new_user.phone,
      role: new_user.role,
      is_blocked: false,
      refresh_token_hash: None,
      created_at: now,
      updated_at: now,
    };
    tables.users.insert(user.id, user.clone());
    Ok(user)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.lock().users.get(&id).cloned())
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.tables.lock().users.values().find(|u| u.email == email).cloned())
  }

  async fn email_exists(&self, email: &str) -> Result<bool> {
    Ok(self.tables.lock().users.values().any(|u| u.email == email))
  }

  async fn set_refresh_token_hash(&self, id: Uuid, digest: Option<&str>) -> Result<()> {
    if let Some(user) = self.tables.lock().users.get_mut(&id) {
      user.refresh_token_hash = digest.map(str::to_string);
      user.updated_at = Utc::now();
    }
    Ok(())
  }

  async fn update_profile(&self, user: &User) -> Result<User> {
    let mut tables = self.tables.lock();
    let stored = tables
      .users
      .get_mut(&user.id)
      .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    stored.first_name = user.first_name.clone();
    stored.last_name = user.last_name.clone();
    stored.phone = user.phone.clone();
    stored.updated_at = Utc::now();
    Ok(stored.clone())
  }

  async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
    if let Some(user) = self.tables.lock().users.get_mut(&id) {
      user.password_hash = password_hash.to_string();
      user.refresh_token_hash = None;
      user.updated_at = Utc::now();
    }
    Ok(())
  }

  async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<User> {
    let mut tables = self.tables.lock();
    let user = tables
      .users
      .get_mut(&id)
      .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    user.is_blocked = blocked;
    user.updated_at = Utc::now();
    Ok(user.clone())
  }

  async fn list_customers(&self, search: Option<&str>, page: PageRequest) -> Result<Page<CustomerSummary>> {
    let tables = self.tables.lock();
    let term = search.map(str::to_lowercase);
    let mut customers: Vec<CustomerSummary> = tables
      .users
      .values()
      .filter(|u| u.role == Role::User)
      .filter(|u| match term.as_deref() {
        None => true,
        Some(t) => {
          u.email.to_lowercase().contains(t)
            || u.first_name.to_lowercase().contains(t)
            || u.last_name.to_lowercase().contains(t)
        }
      })
      .map(|u| CustomerSummary {
        id: u.id,
        email: u.email.clone(),
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
        phone: u.phone.clone(),
        is_blocked: u.is_blocked,
        created_at: u.created_at,
        order_count: tables.orders.iter().filter(|o| o.user_id == u.id).count() as i64,
      })
      .collect();
    customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(page.slice(&customers))
  }

  async fn count_customers(&self) -> Result<i64> {
    Ok(self.tables.lock().users.values().filter(|u| u.role == Role::User).count() as i64)
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
    let tables = self.tables.lock();
    let mut products: Vec<Product> = tables.products.values().filter(|p| filter.matches(p)).cloned().collect();
    products.sort_by(|a, b| {
      let ordering = match filter.sort_by {
        ProductSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductSort::Price => a.price.cmp(&b.price),
        ProductSort::Name => a.name.cmp(&b.name),
      };
      match filter.sort_order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
      }
      .then_with(|| a.id.cmp(&b.id))
    });
    Ok(page.slice(&products))
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.get(&id).cloned())
  }

  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.values().find(|p| p.slug == slug).cloned())
  }

  async fn related_products(&self, category_id: Uuid, exclude: Uuid, limit: i64) -> Result<Vec<Product>> {
    let tables = self.tables.lock();
    let mut related: Vec<Product> = tables
      .products
      .values()
      .filter(|p| p.is_active && p.category_id == category_id && p.id != exclude)
      .cloned()
      .collect();
    related.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    related.truncate(limit.max(0) as usize);
    Ok(related)
  }

  async fn create_product(&self, new_product: NewProduct) -> Result<Product> {
    let mut tables = self.tables.lock();
    let slugs = tables.products.iter().map(|(id, p)| (id, p.slug.as_str()));
    if Tables::slug_taken(slugs, &new_product.slug, None) {
      return Err(AppError::Conflict("A product with this name already exists.".to_string()));
    }
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: new_product.name,
      slug: new_product.slug,
      description: new_product.description,
      price: new_product.price,
      discount_price: new_product.discount_price,
      stock: new_product.stock,
      is_active: true,
      category_id: new_product.category_id,
      brand_id: new_product.brand_id,
      images: new_product.images,
      specifications: new_product.specifications,
      created_at: now,
      updated_at: now,
    };
    tables.products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn update_product(&self, product: &Product) -> Result<Product> {
    let mut tables = self.tables.lock();
    let slugs = tables.products.iter().map(|(id, p)| (id, p.slug.as_str()));
    if Tables::slug_taken(slugs, &product.slug, Some(product.id)) {
      return Err(AppError::Conflict("A product with this name already exists.".to_string()));
    }
    let stored = tables
      .products
      .get_mut(&product.id)
      .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    *stored = Product {
      created_at: stored.created_at,
      updated_at: Utc::now(),
      ..product.clone()
    };
    Ok(stored.clone())
  }

  async fn deactivate_product(&self, id: Uuid) -> Result<bool> {
    match self.tables.lock().products.get_mut(&id) {
      Some(product) => {
        product.is_active = false;
        product.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let mut categories: Vec<Category> = self.tables.lock().categories.values().cloned().collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(categories)
  }

  async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
    Ok(self.tables.lock().categories.get(&id).cloned())
  }

  async fn create_category(&self, draft: TaxonomyDraft) -> Result<Category> {
    let mut tables = self.tables.lock();
    let slugs = tables.categories.iter().map(|(id, c)| (id, c.slug.as_str()));
    if Tables::slug_taken(slugs, &draft.slug, None) {
      return Err(AppError::Conflict("A category with this name already exists.".to_string()));
    }
    let now = Utc::now();
    let category = Category {
      id: Uuid::new_v4(),
      name: draft.name,
      slug: draft.slug,
      description: draft.description,
      image: draft.image,
      created_at: now,
      updated_at: now,
    };
    tables.categories.insert(category.id, category.clone());
    Ok(category)
  }

  async fn update_category(&self, id: Uuid, draft: TaxonomyDraft) -> Result<Option<Category>> {
    let mut tables = self.tables.lock();
    let slugs = tables.categories.iter().map(|(id, c)| (id, c.slug.as_str()));
    if Tables::slug_taken(slugs, &draft.slug, Some(id)) {
      return Err(AppError::Conflict("A category with this name already exists.".to_string()));
    }
    Ok(tables.categories.get_mut(&id).map(|category| {
      category.name = draft.name;
      category.slug = draft.slug;
      category.description = draft.description;
      category.image = draft.image;
      category.updated_at = Utc::now();
      category.clone()
    }))
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    if tables.products.values().any(|p| p.category_id == id) {
      return Err(AppError::Conflict("Category is still used by products".to_string()));
    }
    Ok(tables.categories.remove(&id).is_some())
  }

  async fn list_brands(&self) -> Result<Vec<Brand>> {
    let mut brands: Vec<Brand> = self.tables.lock().brands.values().cloned().collect();
    brands.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(brands)
  }

  async fn find_brand(&self, id: Uuid) -> Result<Option<Brand>> {
    Ok(self.tables.lock().brands.get(&id).cloned())
  }

  async fn create_brand(&self, draft: TaxonomyDraft) -> Result<Brand> {
    let mut tables = self.tables.lock();
    let slugs = tables.brands.iter().map(|(id, b)| (id, b.slug.as_str()));
    if Tables::slug_taken(slugs, &draft.slug, None) {
      return Err(AppError::Conflict("A brand with this name already exists.".to_string()));
    }
    let now = Utc::now();
    let brand = Brand {
      id: Uuid::new_v4(),
      name: draft.name,
      slug: draft.slug,
      description: draft.description,
      logo: draft.image,
      created_at: now,
      updated_at: now,
    };
    tables.brands.insert(brand.id, brand.clone());
    Ok(brand)
  }

  async fn update_brand(&self, id: Uuid, draft: TaxonomyDraft) -> Result<Option<Brand>> {
    let mut tables = self.tables.lock();
    let slugs = tables.brands.iter().map(|(id, b)| (id, b.slug.as_str()));
    if Tables::slug_taken(slugs, &draft.slug, Some(id)) {
      return Err(AppError::Conflict("A brand with this name already exists.".to_string()));
    }
    Ok(tables.brands.get_mut(&id).map(|brand| {
      brand.name = draft.name;
      brand.slug = draft.slug;
      brand.description = draft.description;
      brand.logo = draft.image;
      brand.updated_at = Utc::now();
      brand.clone()
    }))
  }

  async fn delete_brand(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    if tables.products.values().any(|p| p.brand_id == id) {
      return Err(AppError::Conflict("Brand is still used by products".to_string()));
    }
    Ok(tables.brands.remove(&id).is_some())
  }
}

#[async_trait]
impl CartStore for MemoryStore {
  async fn lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .cart_items
        .iter()
        .filter(|i| i.user_id == user_id)
        .filter_map(|item| {
          let product = tables.products.get(&item.product_id).cloned()?;
          Some(CartLine {
            item: item.clone(),
            product,
          })
        })
        .collect(),
    )
  }

  async fn find_item(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<CartItem>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .cart_items
        .iter()
        .find(|i| i.id == item_id && i.user_id == user_id)
        .cloned(),
    )
  }

  async fn find_by_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .cart_items
        .iter()
        .find(|i| i.user_id == user_id && i.product_id == product_id)
        .cloned(),
    )
  }

  async fn add_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let mut tables = self.tables.lock();
    let now = Utc::now();
    if let Some(item) = tables
      .cart_items
      .iter_mut()
      .find(|i| i.user_id == user_id && i.product_id == product_id)
    {
      item.quantity = item
        .quantity
        .checked_add(quantity)
        .ok_or_else(|| AppError::Validation("Quantity out of range".to_string()))?;
      item.updated_at = now;
      return Ok(item.clone());
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      created_at: now,
      updated_at: now,
    };
    tables.cart_items.push(item.clone());
    Ok(item)
  }

  async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> Result<CartItem> {
    let mut tables = self.tables.lock();
    let item = tables
      .cart_items
      .iter_mut()
      .find(|i| i.id == item_id)
      .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;
    item.quantity = quantity;
    item.updated_at = Utc::now();
    Ok(item.clone())
  }

  async fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let before = tables.cart_items.len();
    tables.cart_items.retain(|i| !(i.id == item_id && i.user_id == user_id));
    Ok(tables.cart_items.len() < before)
  }

  async fn clear(&self, user_id: Uuid) -> Result<u64> {
    let mut tables = self.tables.lock();
    let before = tables.cart_items.len();
    tables.cart_items.retain(|i| i.user_id != user_id);
    Ok((before - tables.cart_items.len()) as u64)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn place(&self, new_order: NewOrder) -> Result<Uuid> {
    let mut tables = self.tables.lock();
    if tables.orders.iter().any(|o| o.order_number == new_order.order_number) {
      return Err(AppError::Conflict("Order number collision, please retry.".to_string()));
    }
    // Check every line before touching anything so a failure leaves no trace.
    for line in &new_order.lines {
      let covered = tables
        .products
        .get(&line.product_id)
        .is_some_and(|p| p.is_active && p.stock >= line.quantity);
      if !covered {
        return Err(AppError::InsufficientStock {
          product: line.product_name.clone(),
        });
      }
    }

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    for line in &new_order.lines {
      if let Some(product) = tables.products.get_mut(&line.product_id) {
        product.stock -= line.quantity;
        product.updated_at = now;
      }
      tables.order_items.push(OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: line.product_id,
        quantity: line.quantity,
        price: line.unit_price,
      });
    }
    tables.orders.push(Order {
      id: order_id,
      user_id: new_order.user_id,
      address_id: new_order.address_id,
      order_number: new_order.order_number,
      status: OrderStatus::Pending,
      payment_method: new_order.payment_method,
      total_amount: new_order.total_amount,
      created_at: now,
      updated_at: now,
    });
    tables.cart_items.retain(|i| i.user_id != new_order.user_id);
    Ok(order_id)
  }

  async fn find(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.iter().find(|o| o.id == order_id).cloned())
  }

  async fn find_detail(&self, order_id: Uuid) -> Result<Option<OrderDetail>> {
    let tables = self.tables.lock();
    let Some(order) = tables.orders.iter().find(|o| o.id == order_id).cloned() else {
      return Ok(None);
    };
    Ok(tables.details(vec![order]).into_iter().next())
  }

  async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> Result<Page<OrderDetail>> {
    let tables = self.tables.lock();
    let orders: Vec<Order> = tables.orders.iter().rev().filter(|o| o.user_id == user_id).cloned().collect();
    let Page { items, total } = page.slice(&orders);
    Ok(Page {
      items: tables.details(items),
      total,
    })
  }

  async fn list_all(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<OrderDetail>> {
    let tables = self.tables.lock();
    let orders: Vec<Order> = tables
      .orders
      .iter()
      .rev()
      .filter(|o| status.map_or(true, |s| o.status == s))
      .cloned()
      .collect();
    let Page { items, total } = page.slice(&orders);
    Ok(Page {
      items: tables.details(items),
      total,
    })
  }

  async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
    let mut tables = self.tables.lock();
    Ok(tables.orders.iter_mut().find(|o| o.id == order_id).map(|order| {
      order.status = status;
      order.updated_at = Utc::now();
      order.clone()
    }))
  }

  async fn stats(&self) -> Result<OrderStats> {
    let tables = self.tables.lock();
    Ok(OrderStats {
      total_orders: tables.orders.len() as i64,
      pending_orders: tables.orders.iter().filter(|o| o.status == OrderStatus::Pending).count() as i64,
      total_revenue: tables
        .orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .map(|o| o.total_amount)
        .sum::<Decimal>(),
    })
  }
}

#[async_trait]
impl AddressStore for MemoryStore {
  async fn list(&self, user_id: Uuid) -> Result<Vec<Address>> {
    let mut addresses: Vec<Address> = self
      .tables
      .lock()
      .addresses
      .iter()
      .filter(|a| a.user_id == user_id)
      .cloned()
      .collect();
    addresses.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(b.created_at.cmp(&a.created_at)));
    Ok(addresses)
  }

  async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Address>> {
    let tables = self.tables.lock();
    Ok(tables.addresses.iter().find(|a| a.id == id && a.user_id == user_id).cloned())
  }

  async fn create(&self, user_id: Uuid, draft: AddressDraft) -> Result<Address> {
    let mut tables = self.tables.lock();
    let now = Utc::now();
    if draft.is_default {
      for other in tables.addresses.iter_mut().filter(|a| a.user_id == user_id && a.is_default) {
        other.is_default = false;
        other.updated_at = now;
      }
    }
    let address = Address {
      id: Uuid::new_v4(),
      user_id,
      full_name: draft.full_name,
      phone: draft.phone,
      address_line1: draft.address_line1,
      address_line2: draft.address_line2,
      city: draft.city,
      state: draft.state,
      postal_code: draft.postal_code,
      country: draft.country,
      is_default: draft.is_default,
      created_at: now,
      updated_at: now,
    };
    tables.addresses.push(address.clone());
    Ok(address)
  }

  async fn update(&self, user_id: Uuid, id: Uuid, draft: AddressDraft) -> Result<Option<Address>> {
    let mut tables = self.tables.lock();
    if !tables.addresses.iter().any(|a| a.id == id && a.user_id == user_id) {
      return Ok(None);
    }
    let now = Utc::now();
    let mut updated = None;
    for address in tables.addresses.iter_mut().filter(|a| a.user_id == user_id) {
      if address.id == id {
        address.full_name = draft.full_name.clone();
        address.phone = draft.phone.clone();
        address.address_line1 = draft.address_line1.clone();
        address.address_line2 = draft.address_line2.clone();
        address.city = draft.city.clone();
        address.state = draft.state.clone();
        address.postal_code = draft.postal_code.clone();
        address.country = draft.country.clone();
        address.is_default = draft.is_default;
        address.updated_at = now;
        updated = Some(address.clone());
      } else if draft.is_default && address.is_default {
        address.is_default = false;
        address.updated_at = now;
      }
    }
    Ok(updated)
  }

  async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    if tables.orders.iter().any(|o| o.address_id == id && o.user_id == user_id) {
      return Err(AppError::Conflict("Address is used by an order".to_string()));
    }
    let before = tables.addresses.len();
    tables.addresses.retain(|a| !(a.id == id && a.user_id == user_id));
    Ok(tables.addresses.len() < before)
  }
}

#[async_trait]
impl WishlistStore for MemoryStore {
  async fn list(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .wishlist
        .iter()
        .rev()
        .filter(|w| w.user_id == user_id)
        .filter_map(|item| {
          let product = tables.products.get(&item.product_id).cloned()?;
          Some(WishlistEntry {
            item: item.clone(),
            product,
          })
        })
        .collect(),
    )
  }

  async fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem> {
    let mut tables = self.tables.lock();
    if tables.wishlist.iter().any(|w| w.user_id == user_id && w.product_id == product_id) {
      return Err(AppError::Conflict("Product is already in the wishlist.".to_string()));
    }
    let item = WishlistItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      created_at: Utc::now(),
    };
    tables.wishlist.push(item.clone());
    Ok(item)
  }

  async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let before = tables.wishlist.len();
    tables.wishlist.retain(|w| !(w.user_id == user_id && w.product_id == product_id));
    Ok(tables.wishlist.len() < before)
  }
}
