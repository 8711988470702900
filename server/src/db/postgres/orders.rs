use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use super::{conflict_on_unique, PgStore, ADDRESS_COLUMNS, ORDER_COLUMNS, PRODUCT_COLUMNS};
use crate::db::{assemble_order_details, OrderStats, OrderStore};
use crate::errors::{AppError, Result};
use crate::models::{
  Address, CustomerRef, NewOrder, Order, OrderDetail, OrderItem, OrderStatus, Page, PageRequest, Product,
};

impl PgStore {
  async fn hydrate(&self, orders: Vec<Order>) -> Result<Vec<OrderDetail>> {
    if orders.is_empty() {
      return Ok(Vec::new());
    }
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let address_ids: Vec<Uuid> = orders.iter().map(|o| o.address_id).collect();
    let user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();

    let items = sqlx::query_as::<_, OrderItem>(
      "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = ANY($1)",
    )
    .bind(&order_ids)
    .fetch_all(&self.pool)
    .await?;

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products = sqlx::query_as::<_, Product>(&format!(
      "SELECT {} FROM products WHERE id = ANY($1)",
      PRODUCT_COLUMNS
    ))
    .bind(&product_ids)
    .fetch_all(&self.pool)
    .await?;

    let addresses = sqlx::query_as::<_, Address>(&format!(
      "SELECT {} FROM addresses WHERE id = ANY($1)",
      ADDRESS_COLUMNS
    ))
    .bind(&address_ids)
    .fetch_all(&self.pool)
    .await?;

    let customers = sqlx::query_as::<_, CustomerRef>(
      "SELECT id, email, first_name, last_name, phone FROM users WHERE id = ANY($1)",
    )
    .bind(&user_ids)
    .fetch_all(&self.pool)
    .await?;

    Ok(assemble_order_details(orders, items, products, addresses, customers))
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn place(&self, new_order: NewOrder) -> Result<Uuid> {
    let order_id = Uuid::new_v4();
    let mut tx = self.pool.begin().await?;

    sqlx::query(
      "INSERT INTO orders (id, user_id, address_id, order_number, status, payment_method, total_amount) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(order_id)
    .bind(new_order.user_id)
    .bind(new_order.address_id)
    .bind(&new_order.order_number)
    .bind(OrderStatus::Pending)
    .bind(new_order.payment_method)
    .bind(new_order.total_amount)
    .execute(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "Order number collision, please retry."))?;

    for line in &new_order.lines {
      sqlx::query("INSERT INTO order_items (id, order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4, $5)")
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(&mut *tx)
        .await?;

      // Conditional decrement: a concurrent placement that drained the stock leaves zero rows here.
      let decremented = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = NOW() WHERE id = $2 AND is_active AND stock >= $1",
      )
      .bind(line.quantity)
      .bind(line.product_id)
      .execute(&mut *tx)
      .await?;
      if decremented.rows_affected() == 0 {
        warn!(product_id = %line.product_id, "Stock changed during order placement; rolling back.");
        return Err(AppError::InsufficientStock {
          product: line.product_name.clone(),
        });
      }
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(new_order.user_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    info!(%order_id, order_number = %new_order.order_number, "Order transaction committed.");
    Ok(order_id)
  }

  async fn find(&self, order_id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(&self.pool).await?)
  }

  async fn find_detail(&self, order_id: Uuid) -> Result<Option<OrderDetail>> {
    let Some(order) = OrderStore::find(self, order_id).await? else {
      return Ok(None);
    };
    Ok(self.hydrate(vec![order]).await?.into_iter().next())
  }

  async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> Result<Page<OrderDetail>> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
      .bind(user_id)
      .fetch_one(&self.pool)
      .await?;
    let sql = format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
      ORDER_COLUMNS
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
      .bind(user_id)
      .bind(page.limit_i64())
      .bind(page.offset())
      .fetch_all(&self.pool)
      .await?;
    Ok(Page {
      items: self.hydrate(orders).await?,
      total,
    })
  }

  async fn list_all(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<OrderDetail>> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
    if let Some(status) = status {
      count_qb.push(" WHERE status = ").push_bind(status);
      qb.push(" WHERE status = ").push_bind(status);
    }
    let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

    qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(page.limit_i64());
    qb.push(" OFFSET ").push_bind(page.offset());
    let orders = qb.build_query_as::<Order>().fetch_all(&self.pool).await?;
    Ok(Page {
      items: self.hydrate(orders).await?,
      total,
    })
  }

  async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
    let sql = format!(
      "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Order>(&sql)
        .bind(status)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn stats(&self) -> Result<OrderStats> {
    let (total_orders, pending_orders, total_revenue) = sqlx::query_as::<_, (i64, i64, Decimal)>(
      "SELECT COUNT(*), \
         COUNT(*) FILTER (WHERE status = 'PENDING'), \
         COALESCE(SUM(total_amount) FILTER (WHERE status <> 'CANCELLED'), 0) \
       FROM orders",
    )
    .fetch_one(&self.pool)
    .await?;
    Ok(OrderStats {
      total_orders,
      pending_orders,
      total_revenue,
    })
  }
}
