mod postgres;

pub use postgres::PostgresOrderRepository;

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::models::Order;

/// Persistence boundary for order aggregates.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the order and all of its items as one atomic unit, returning
    /// the order with database identities assigned.
    async fn save(&self, order: Order) -> Result<Order, StorageError>;

    /// Load an order (with items) by its order number.
    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, StorageError>;
}
