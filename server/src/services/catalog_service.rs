//! Products, categories and brands.

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::requests::{ProductListQuery, ProductPayload, ProductUpdatePayload, TaxonomyPayload};
use crate::models::{
  slugify, Brand, Category, NewProduct, Page, PageRequest, Product, ProductDetail, ProductFilter, TaxonomyDraft,
};
use crate::state::AppState;

pub const PRODUCT_PAGE_SIZE: u32 = 12;
const RELATED_PRODUCTS: i64 = 8;

fn product_not_found() -> AppError {
  AppError::NotFound("Product not found".to_string())
}

fn slug_for(name: &str) -> Result<String> {
  let slug = slugify(name);
  if slug.is_empty() {
    return Err(AppError::Validation("Name must contain letters or digits".to_string()));
  }
  Ok(slug)
}

fn check_discount(price: Decimal, discount_price: Option<Decimal>) -> Result<()> {
  match discount_price {
    Some(discount) if discount >= price => Err(AppError::Validation(
      "Discount price must be less than original price".to_string(),
    )),
    _ => Ok(()),
  }
}

async fn check_references(app_state: &AppState, category_id: Uuid, brand_id: Uuid) -> Result<()> {
  if app_state.repos.catalog.find_category(category_id).await?.is_none() {
    return Err(AppError::Validation("Category does not exist".to_string()));
  }
  if app_state.repos.catalog.find_brand(brand_id).await?.is_none() {
    return Err(AppError::Validation("Brand does not exist".to_string()));
  }
  Ok(())
}

#[instrument(name = "catalog_service::list_products", skip(app_state, query))]
pub async fn list_products(app_state: &AppState, query: ProductListQuery) -> Result<(Page<Product>, PageRequest)> {
  let page = query.page_query().resolve(PRODUCT_PAGE_SIZE)?;
  if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
    if min > max {
      return Err(AppError::Validation("minPrice cannot exceed maxPrice".to_string()));
    }
  }
  let filter = ProductFilter {
    category_id: query.category_id,
    brand_id: query.brand_id,
    min_price: query.min_price,
    max_price: query.max_price,
    in_stock: query.in_stock.unwrap_or(false),
    search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    sort_by: query.sort_by.unwrap_or_default(),
    sort_order: query.sort_order.unwrap_or_default(),
  };
  let products = app_state.repos.catalog.list_products(&filter, page).await?;
  Ok((products, page))
}

async fn detail(app_state: &AppState, product: Product, related_products: Vec<Product>) -> Result<ProductDetail> {
  let category = app_state.repos.catalog.find_category(product.category_id).await?;
  let brand = app_state.repos.catalog.find_brand(product.brand_id).await?;
  Ok(ProductDetail {
    product,
    category,
    brand,
    related_products,
  })
}

pub async fn get_product(app_state: &AppState, id: Uuid) -> Result<ProductDetail> {
  let product = app_state
    .repos
    .catalog
    .find_product(id)
    .await?
    .filter(|p| p.is_active)
    .ok_or_else(product_not_found)?;
  detail(app_state, product, Vec::new()).await
}

pub async fn get_product_by_slug(app_state: &AppState, slug: &str) -> Result<ProductDetail> {
  let product = app_state
    .repos
    .catalog
    .find_product_by_slug(slug)
    .await?
    .filter(|p| p.is_active)
    .ok_or_else(product_not_found)?;
  let related = app_state
    .repos
    .catalog
    .related_products(product.category_id, product.id, RELATED_PRODUCTS)
    .await?;
  detail(app_state, product, related).await
}

#[instrument(name = "catalog_service::create_product", skip(app_state, payload), fields(name = %payload.name))]
pub async fn create_product(app_state: &AppState, payload: ProductPayload) -> Result<Product> {
  payload.validate()?;
  check_discount(payload.price, payload.discount_price)?;
  check_references(app_state, payload.category_id, payload.brand_id).await?;

  let name = payload.name.trim().to_string();
  let product = app_state
    .repos
    .catalog
    .create_product(NewProduct {
      slug: slug_for(&name)?,
      name,
      description: Some(payload.description.trim().to_string()),
      price: payload.price,
      discount_price: payload.discount_price,
      stock: payload.stock,
      category_id: payload.category_id,
      brand_id: payload.brand_id,
      images: payload.images,
      specifications: payload.specifications,
    })
    .await?;
  info!(product_id = %product.id, slug = %product.slug, "Product created.");
  Ok(product)
}

#[instrument(name = "catalog_service::update_product", skip(app_state, payload))]
pub async fn update_product(app_state: &AppState, id: Uuid, payload: ProductUpdatePayload) -> Result<Product> {
  payload.validate()?;
  payload.validate_discount()?;
  let mut product = app_state
    .repos
    .catalog
    .find_product(id)
    .await?
    .ok_or_else(product_not_found)?;

  if let Some(name) = payload.name {
    product.name = name.trim().to_string();
    product.slug = slug_for(&product.name)?;
  }
  if let Some(description) = payload.description {
    product.description = Some(description.trim().to_string());
  }
  if let Some(price) = payload.price {
    product.price = price;
  }
  if let Some(discount_price) = payload.discount_price {
    product.discount_price = discount_price;
  }
  if let Some(stock) = payload.stock {
    product.stock = stock;
  }
  if let Some(category_id) = payload.category_id {
    product.category_id = category_id;
  }
  if let Some(brand_id) = payload.brand_id {
    product.brand_id = brand_id;
  }
  if let Some(images) = payload.images {
    product.images = images;
  }
  if let Some(specifications) = payload.specifications {
    product.specifications = specifications;
  }
  if let Some(is_active) = payload.is_active {
    product.is_active = is_active;
  }

  check_discount(product.price, product.discount_price)?;
  if payload.category_id.is_some() || payload.brand_id.is_some() {
    check_references(app_state, product.category_id, product.brand_id).await?;
  }
  app_state.repos.catalog.update_product(&product).await
}

#[instrument(name = "catalog_service::delete_product", skip(app_state))]
pub async fn delete_product(app_state: &AppState, id: Uuid) -> Result<()> {
  if app_state.repos.catalog.deactivate_product(id).await? {
    info!("Product deactivated.");
    Ok(())
  } else {
    Err(product_not_found())
  }
}

/// Merges `payload` over `current` (name, description, image).
fn taxonomy_draft(
  payload: TaxonomyPayload,
  current: Option<(&str, Option<&str>, Option<&str>)>,
) -> Result<TaxonomyDraft> {
  payload.validate()?;
  let name = match (payload.name, current) {
    (Some(name), _) => name.trim().to_string(),
    (None, Some((name, _, _))) => name.to_string(),
    (None, None) => return Err(AppError::Validation("Name is required".to_string())),
  };
  let description = payload
    .description
    .map(|d| d.trim().to_string())
    .or_else(|| current.and_then(|(_, d, _)| d.map(str::to_string)));
  let image = payload
    .image
    .or_else(|| current.and_then(|(_, _, i)| i.map(str::to_string)));
  Ok(TaxonomyDraft {
    slug: slug_for(&name)?,
    name,
    description,
    image,
  })
}

pub async fn list_categories(app_state: &AppState) -> Result<Vec<Category>> {
  app_state.repos.catalog.list_categories().await
}

pub async fn get_category(app_state: &AppState, id: Uuid) -> Result<Category> {
  app_state
    .repos
    .catalog
    .find_category(id)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

#[instrument(name = "catalog_service::create_category", skip(app_state, payload))]
pub async fn create_category(app_state: &AppState, payload: TaxonomyPayload) -> Result<Category> {
  let draft = taxonomy_draft(payload, None)?;
  app_state.repos.catalog.create_category(draft).await
}

#[instrument(name = "catalog_service::update_category", skip(app_state, payload))]
pub async fn update_category(app_state: &AppState, id: Uuid, payload: TaxonomyPayload) -> Result<Category> {
  let current = get_category(app_state, id).await?;
  let draft = taxonomy_draft(
    payload,
    Some((&current.name, current.description.as_deref(), current.image.as_deref())),
  )?;
  app_state
    .repos
    .catalog
    .update_category(id, draft)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

#[instrument(name = "catalog_service::delete_category", skip(app_state))]
pub async fn delete_category(app_state: &AppState, id: Uuid) -> Result<()> {
  if app_state.repos.catalog.delete_category(id).await? {
    Ok(())
  } else {
    warn!("Delete requested for a missing category.");
    Err(AppError::NotFound("Category not found".to_string()))
  }
}

pub async fn list_brands(app_state: &AppState) -> Result<Vec<Brand>> {
  app_state.repos.catalog.list_brands().await
}

pub async fn get_brand(app_state: &AppState, id: Uuid) -> Result<Brand> {
  app_state
    .repos
    .catalog
    .find_brand(id)
    .await?
    .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))
}

#[instrument(name = "catalog_service::create_brand", skip(app_state, payload))]
pub async fn create_brand(app_state: &AppState, payload: TaxonomyPayload) -> Result<Brand> {
  let draft = taxonomy_draft(payload, None)?;
  app_state.repos.catalog.create_brand(draft).await
}

#[instrument(name = "catalog_service::update_brand", skip(app_state, payload))]
pub async fn update_brand(app_state: &AppState, id: Uuid, payload: TaxonomyPayload) -> Result<Brand> {
  let current = get_brand(app_state, id).await?;
  let draft = taxonomy_draft(
    payload,
    Some((&current.name, current.description.as_deref(), current.logo.as_deref())),
  )?;
  app_state
    .repos
    .catalog
    .update_brand(id, draft)
    .await?
    .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))
}

#[instrument(name = "catalog_service::delete_brand", skip(app_state))]
pub async fn delete_brand(app_state: &AppState, id: Uuid) -> Result<()> {
  if app_state.repos.catalog.delete_brand(id).await? {
    Ok(())
  } else {
    Err(AppError::NotFound("Brand not found".to_string()))
  }
}
