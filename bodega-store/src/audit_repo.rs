use async_trait::async_trait;
use sqlx::PgPool;

use bodega_core::audit::{AuditEntry, AuditStore};
use bodega_core::CoreResult;

use crate::database::storage_error;

pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn persist_entry(&self, entry: &AuditEntry) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, ts, username, display_name, action, product_key, \
             category, subcategory, brand, price, amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(entry.id)
        .bind(entry.timestamp)
        .bind(&entry.username)
        .bind(&entry.display_name)
        .bind(entry.action.as_str())
        .bind(&entry.product_key)
        .bind(entry.category.as_deref())
        .bind(entry.subcategory.as_deref())
        .bind(entry.brand.as_deref())
        .bind(entry.price.map(i64::from))
        .bind(entry.amount.map(i64::from))
        .execute(&self.pool)
        .await
        .map_err(|err| storage_error("appending audit entry", err))?;
        Ok(())
    }
}
