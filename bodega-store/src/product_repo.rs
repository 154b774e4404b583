use async_trait::async_trait;
use sqlx::PgPool;

use bodega_catalog::{Product, ProductRepository, StockReservation};
use bodega_core::{CoreError, CoreResult};

use crate::database::storage_error;

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    key: String,
    category: String,
    subcategory: String,
    brand: String,
    price: i64,
    quantity: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            key: row.key,
            category: row.category,
            subcategory: row.subcategory,
            brand: row.brand,
            price: row.price.max(0) as u32,
            quantity: row.quantity.max(0) as u32,
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get_product(&self, key: &str) -> CoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT key, category, subcategory, brand, price, quantity FROM products WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| storage_error("loading product", err))?;

        Ok(row.map(Product::from))
    }

    async fn insert_product(&self, product: &Product) -> CoreResult<()> {
        product.validate()?;
        sqlx::query(
            "INSERT INTO products (key, category, subcategory, brand, price, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&product.key)
        .bind(&product.category)
        .bind(&product.subcategory)
        .bind(&product.brand)
        .bind(i64::from(product.price))
        .bind(i64::from(product.quantity))
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Conflict(format!("product {} already exists", product.key))
            }
            other => storage_error("inserting product", other),
        })?;
        Ok(())
    }

    async fn delete_product(&self, key: &str) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| storage_error("deleting product", err))?;
        Ok(result.rows_affected() > 0)
    }

    async fn reserve_stock(&self, key: &str, amount: u32) -> CoreResult<StockReservation> {
        // The WHERE clause is the availability check; the row only changes
        // when enough stock is on hand, in one statement.
        let remaining = sqlx::query_scalar::<_, i64>(
            "UPDATE products SET quantity = quantity - $2 \
             WHERE key = $1 AND quantity >= $2 RETURNING quantity",
        )
        .bind(key)
        .bind(i64::from(amount))
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| storage_error("reserving stock", err))?;

        if let Some(remaining) = remaining {
            return Ok(StockReservation::Reserved {
                remaining: remaining.max(0) as u32,
            });
        }

        let available = sqlx::query_scalar::<_, i64>("SELECT quantity FROM products WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| storage_error("reading stock", err))?;

        match available {
            Some(available) => Ok(StockReservation::Insufficient {
                available: available.max(0) as u32,
            }),
            None => Ok(StockReservation::Missing),
        }
    }

    async fn release_stock(&self, key: &str, amount: u32) -> CoreResult<()> {
        sqlx::query("UPDATE products SET quantity = quantity + $2 WHERE key = $1")
            .bind(key)
            .bind(i64::from(amount))
            .execute(&self.pool)
            .await
            .map_err(|err| storage_error("releasing stock", err))?;
        Ok(())
    }
}
