use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::catalog::{Brand, Category};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub discount_price: Option<Decimal>,
  pub stock: i32,
  pub is_active: bool,
  pub category_id: Uuid,
  pub brand_id: Uuid,
  #[sqlx(json)]
  pub images: Vec<String>,
  #[sqlx(json)]
  pub specifications: BTreeMap<String, String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// The price a buyer pays: the discount when it undercuts the list price.
  pub fn effective_price(&self) -> Decimal {
    match self.discount_price {
      Some(discount) if discount < self.price => discount,
      _ => self.price,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
  #[serde(flatten)]
  pub product: Product,
  pub category: Option<Category>,
  pub brand: Option<Brand>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub related_products: Vec<Product>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub discount_price: Option<Decimal>,
  pub stock: i32,
  pub category_id: Uuid,
  pub brand_id: Uuid,
  pub images: Vec<String>,
  pub specifications: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
  #[default]
  CreatedAt,
  Price,
  Name,
}

impl ProductSort {
  pub fn column(&self) -> &'static str {
    match self {
      ProductSort::CreatedAt => "created_at",
      ProductSort::Price => "price",
      ProductSort::Name => "name",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  pub fn keyword(&self) -> &'static str {
    match self {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    }
  }
}

/// Storefront listing filters. Inactive products are never listed.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
  pub category_id: Option<Uuid>,
  pub brand_id: Option<Uuid>,
  pub min_price: Option<Decimal>,
  pub max_price: Option<Decimal>,
  pub in_stock: bool,
  pub search: Option<String>,
  pub sort_by: ProductSort,
  pub sort_order: SortOrder,
}

impl ProductFilter {
  /// Same predicate the SQL adapter builds, used by the in-memory store.
  pub fn matches(&self, product: &Product) -> bool {
    if !product.is_active {
      return false;
    }
    if self.category_id.is_some_and(|id| id != product.category_id) {
      return false;
    }
    if self.brand_id.is_some_and(|id| id != product.brand_id) {
      return false;
    }
    if self.min_price.is_some_and(|min| product.price < min) {
      return false;
    }
    if self.max_price.is_some_and(|max| product.price > max) {
      return false;
    }
    if self.in_stock && product.stock <= 0 {
      return false;
    }
    if let Some(term) = self.search.as_deref() {
      let term = term.to_lowercase();
      let in_name = product.name.to_lowercase().contains(&term);
      let in_description = product
        .description
        .as_deref()
        .is_some_and(|d| d.to_lowercase().contains(&term));
      if !in_name && !in_description {
        return false;
      }
    }
    true
  }
}

/// URL slug from a display name: lower-cased, spaces to hyphens, anything
/// outside `[a-z0-9-]` dropped.
pub fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  for c in name.trim().to_lowercase().chars() {
    if c.is_whitespace() {
      if !slug.ends_with('-') {
        slug.push('-');
      }
    } else if c.is_ascii_alphanumeric() || c == '-' {
      slug.push(c);
    }
  }
  slug.trim_matches('-').to_string()
}
