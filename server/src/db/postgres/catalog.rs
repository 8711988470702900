use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{conflict_on_unique, like_pattern, PgStore, PRODUCT_COLUMNS};
use crate::db::CatalogStore;
use crate::errors::{AppError, Result};
use crate::models::{Brand, Category, NewProduct, Page, PageRequest, Product, ProductFilter, TaxonomyDraft};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, created_at, updated_at";
const BRAND_COLUMNS: &str = "id, name, slug, description, logo, created_at, updated_at";

/// Appends the `WHERE` clause for `filter`. The caller has already pushed the `SELECT ... FROM products` head.
fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
  qb.push(" WHERE is_active");
  if let Some(category_id) = filter.category_id {
    qb.push(" AND category_id = ").push_bind(category_id);
  }
  if let Some(brand_id) = filter.brand_id {
    qb.push(" AND brand_id = ").push_bind(brand_id);
  }
  if let Some(min_price) = filter.min_price {
    qb.push(" AND price >= ").push_bind(min_price);
  }
  if let Some(max_price) = filter.max_price {
    qb.push(" AND price <= ").push_bind(max_price);
  }
  if filter.in_stock {
    qb.push(" AND stock > 0");
  }
  if let Some(term) = filter.search.as_deref() {
    let pattern = like_pattern(term);
    qb.push(" AND (name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR description ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    push_product_filters(&mut count_qb, filter);
    let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
    push_product_filters(&mut qb, filter);
    qb.push(format!(
      " ORDER BY {} {}, id",
      filter.sort_by.column(),
      filter.sort_order.keyword()
    ));
    qb.push(" LIMIT ").push_bind(page.limit_i64());
    qb.push(" OFFSET ").push_bind(page.offset());
    let items = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

    Ok(Page { items, total })
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE slug = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).bind(slug).fetch_optional(&self.pool).await?)
  }

  async fn related_products(&self, category_id: Uuid, exclude: Uuid, limit: i64) -> Result<Vec<Product>> {
    let sql = format!(
      "SELECT {} FROM products WHERE is_active AND category_id = $1 AND id <> $2 ORDER BY created_at DESC LIMIT $3",
      PRODUCT_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(category_id)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn create_product(&self, new_product: NewProduct) -> Result<Product> {
    let sql = format!(
      "INSERT INTO products (id, name, slug, description, price, discount_price, stock, category_id, brand_id, \
         images, specifications) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
      PRODUCT_COLUMNS
    );
    sqlx::query_as::<_, Product>(&sql)
      .bind(Uuid::new_v4())
      .bind(&new_product.name)
      .bind(&new_product.slug)
      .bind(&new_product.description)
      .bind(new_product.price)
      .bind(new_product.discount_price)
      .bind(new_product.stock)
      .bind(new_product.category_id)
      .bind(new_product.brand_id)
      .bind(Json(&new_product.images))
      .bind(Json(&new_product.specifications))
      .fetch_one(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "A product with this name already exists."))
  }

  async fn update_product(&self, product: &Product) -> Result<Product> {
    let sql = format!(
      "UPDATE products SET name = $1, slug = $2, description = $3, price = $4, discount_price = $5, stock = $6, \
         is_active = $7, category_id = $8, brand_id = $9, images = $10, specifications = $11, updated_at = NOW() \
       WHERE id = $12 RETURNING {}",
      PRODUCT_COLUMNS
    );
    sqlx::query_as::<_, Product>(&sql)
      .bind(&product.name)
      .bind(&product.slug)
      .bind(&product.description)
      .bind(product.price)
      .bind(product.discount_price)
      .bind(product.stock)
      .bind(product.is_active)
      .bind(product.category_id)
      .bind(product.brand_id)
      .bind(Json(&product.images))
      .bind(Json(&product.specifications))
      .bind(product.id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "A product with this name already exists."))?
      .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
  }

  async fn deactivate_product(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let sql = format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLUMNS);
    Ok(sqlx::query_as::<_, Category>(&sql).fetch_all(&self.pool).await?)
  }

  async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
    Ok(sqlx::query_as::<_, Category>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn create_category(&self, draft: TaxonomyDraft) -> Result<Category> {
    let sql = format!(
      "INSERT INTO categories (id, name, slug, description, image) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      CATEGORY_COLUMNS
    );
    sqlx::query_as::<_, Category>(&sql)
      .bind(Uuid::new_v4())
      .bind(&draft.name)
      .bind(&draft.slug)
      .bind(&draft.description)
      .bind(&draft.image)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "A category with this name already exists."))
  }

  async fn update_category(&self, id: Uuid, draft: TaxonomyDraft) -> Result<Option<Category>> {
    let sql = format!(
      "UPDATE categories SET name = $1, slug = $2, description = $3, image = $4, updated_at = NOW() \
       WHERE id = $5 RETURNING {}",
      CATEGORY_COLUMNS
    );
    sqlx::query_as::<_, Category>(&sql)
      .bind(&draft.name)
      .bind(&draft.slug)
      .bind(&draft.description)
      .bind(&draft.image)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "A category with this name already exists."))
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    let in_use = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1)")
      .bind(id)
      .fetch_one(&self.pool)
      .await?;
    if in_use {
      return Err(AppError::Conflict("Category is still used by products".to_string()));
    }
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_brands(&self) -> Result<Vec<Brand>> {
    let sql = format!("SELECT {} FROM brands ORDER BY name", BRAND_COLUMNS);
    Ok(sqlx::query_as::<_, Brand>(&sql).fetch_all(&self.pool).await?)
  }

  async fn find_brand(&self, id: Uuid) -> Result<Option<Brand>> {
    let sql = format!("SELECT {} FROM brands WHERE id = $1", BRAND_COLUMNS);
    Ok(sqlx::query_as::<_, Brand>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn create_brand(&self, draft: TaxonomyDraft) -> Result<Brand> {
    let sql = format!(
      "INSERT INTO brands (id, name, slug, description, logo) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      BRAND_COLUMNS
    );
    sqlx::query_as::<_, Brand>(&sql)
      .bind(Uuid::new_v4())
      .bind(&draft.name)
      .bind(&draft.slug)
      .bind(&draft.description)
      .bind(&draft.image)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "A brand with this name already exists."))
  }

  async fn update_brand(&self, id: Uuid, draft: TaxonomyDraft) -> Result<Option<Brand>> {
    let sql = format!(
      "UPDATE brands SET name = $1, slug = $2, description = $3, logo = $4, updated_at = NOW() \
       WHERE id = $5 RETURNING {}",
      BRAND_COLUMNS
    );
    sqlx::query_as::<_, Brand>(&sql)
      .bind(&draft.name)
      .bind(&draft.slug)
      .bind(&draft.description)
      .bind(&draft.image)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "A brand with this name already exists."))
  }

  async fn delete_brand(&self, id: Uuid) -> Result<bool> {
    let in_use = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE brand_id = $1)")
      .bind(id)
      .fetch_one(&self.pool)
      .await?;
    if in_use {
      return Err(AppError::Conflict("Brand is still used by products".to_string()));
    }
    let result = sqlx::query("DELETE FROM brands WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }
}
