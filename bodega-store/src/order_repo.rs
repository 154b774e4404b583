use async_trait::async_trait;
use sqlx::PgPool;

use bodega_core::{CoreError, CoreResult};
use bodega_order::{Order, OrderRepository};

use crate::database::storage_error;

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Line items and the address snapshot are embedded documents with no
// identity of their own, so they travel as JSONB alongside the order row.
#[derive(sqlx::FromRow)]
struct OrderRow {
    box_key: String,
    username: String,
    display_name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    checked_out_at: Option<chrono::DateTime<chrono::Utc>>,
    line_items: serde_json::Value,
    delivery_address: Option<serde_json::Value>,
    user_pending: bool,
    admin_pending: bool,
}

impl OrderRow {
    fn into_order(self) -> CoreResult<Order> {
        let line_items = serde_json::from_value(self.line_items)
            .map_err(|err| storage_error("decoding line items", err))?;
        let delivery_address = match self.delivery_address {
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|err| storage_error("decoding delivery address", err))?,
            ),
            None => None,
        };
        Ok(Order {
            box_key: self.box_key,
            username: self.username,
            display_name: self.display_name,
            created_at: self.created_at,
            checked_out_at: self.checked_out_at,
            line_items,
            delivery_address,
            user_pending: self.user_pending,
            admin_pending: self.admin_pending,
        })
    }
}

const ORDER_COLUMNS: &str = "box_key, username, display_name, created_at, checked_out_at, \
                             line_items, delivery_address, user_pending, admin_pending";

fn encode_items(order: &Order) -> CoreResult<serde_json::Value> {
    serde_json::to_value(&order.line_items).map_err(|err| storage_error("encoding line items", err))
}

fn encode_address(order: &Order) -> CoreResult<Option<serde_json::Value>> {
    order
        .delivery_address
        .as_ref()
        .map(|address| {
            serde_json::to_value(address)
                .map_err(|err| storage_error("encoding delivery address", err))
        })
        .transpose()
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn get_order(&self, box_key: &str) -> CoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE box_key = $1",
            ORDER_COLUMNS
        ))
        .bind(box_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| storage_error("loading order", err))?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn insert_order(&self, order: &Order) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO orders (box_key, username, display_name, created_at, checked_out_at, \
             line_items, delivery_address, user_pending, admin_pending) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&order.box_key)
        .bind(&order.username)
        .bind(&order.display_name)
        .bind(order.created_at)
        .bind(order.checked_out_at)
        .bind(encode_items(order)?)
        .bind(encode_address(order)?)
        .bind(order.user_pending)
        .bind(order.admin_pending)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Conflict(format!("box key {} is already taken", order.box_key))
            }
            other => storage_error("inserting order", other),
        })?;
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET username = $2, display_name = $3, created_at = $4, \
             checked_out_at = $5, line_items = $6, delivery_address = $7, \
             user_pending = $8, admin_pending = $9 WHERE box_key = $1",
        )
        .bind(&order.box_key)
        .bind(&order.username)
        .bind(&order.display_name)
        .bind(order.created_at)
        .bind(order.checked_out_at)
        .bind(encode_items(order)?)
        .bind(encode_address(order)?)
        .bind(order.user_pending)
        .bind(order.admin_pending)
        .execute(&self.pool)
        .await
        .map_err(|err| storage_error("updating order", err))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "no box with key {}",
                order.box_key
            )));
        }
        Ok(())
    }

    async fn delete_order(&self, box_key: &str) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE box_key = $1")
            .bind(box_key)
            .execute(&self.pool)
            .await
            .map_err(|err| storage_error("deleting order", err))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_open_order(&self, username: &str) -> CoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE username = $1 AND user_pending LIMIT 1",
            ORDER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| storage_error("finding open order", err))?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn list_awaiting_fulfillment(&self) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE admin_pending AND NOT user_pending \
             ORDER BY checked_out_at ASC NULLS LAST",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| storage_error("listing orders awaiting fulfillment", err))?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn list_closed_orders(&self, username: &str) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE username = $1 AND NOT user_pending \
             ORDER BY checked_out_at DESC NULLS LAST",
            ORDER_COLUMNS
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| storage_error("listing past orders", err))?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}
