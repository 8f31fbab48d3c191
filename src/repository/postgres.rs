use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::errors::StorageError;
use crate::models::{Order, OrderItem};
use crate::repository::OrderRepository;

// ============================================================================
// Postgres Order Repository
// ============================================================================
//
// One transaction per save: the order row and every item row commit together
// or not at all. The schema carries the one-to-many relation with
// ON DELETE CASCADE, so items cannot outlive their order.
//
// ============================================================================

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, mut order: Order) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i64 =
            sqlx::query_scalar("INSERT INTO orders (order_number) VALUES ($1) RETURNING id")
                .bind(&order.order_number)
                .fetch_one(&mut *tx)
                .await?;

        for item in &mut order.items {
            let item_id: i64 = sqlx::query_scalar(
                "INSERT INTO order_items (order_id, sku_code, price, quantity) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(order_id)
            .bind(&item.sku_code)
            .bind(item.price)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;

            item.id = Some(item_id);
        }

        tx.commit().await?;

        order.id = Some(order_id);

        tracing::debug!(
            order_id,
            order_number = %order.order_number,
            items = order.items.len(),
            "Order persisted"
        );

        Ok(order)
    }

    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, StorageError> {
        let row = sqlx::query("SELECT id, order_number FROM orders WHERE order_number = $1")
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order_id: i64 = row.try_get("id")?;

        let item_rows = sqlx::query(
            "SELECT id, sku_code, price, quantity FROM order_items \
             WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .into_iter()
            .map(|r| {
                Ok(OrderItem {
                    id: Some(r.try_get::<i64, _>("id")?),
                    sku_code: r.try_get("sku_code")?,
                    price: r.try_get::<Decimal, _>("price")?,
                    quantity: r.try_get("quantity")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Some(Order {
            id: Some(order_id),
            order_number: row.try_get("order_number")?,
            items,
        }))
    }
}
