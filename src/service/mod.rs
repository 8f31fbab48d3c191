use std::sync::Arc;
use std::time::Instant;

use crate::errors::OrderServiceError;
use crate::inventory::InventoryClient;
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;
use crate::models::{Order, OrderRequest};
use crate::repository::OrderRepository;
use crate::utils::{CircuitBreaker, CircuitBreakerError};

// ============================================================================
// Order Workflow
// ============================================================================
//
// place_order orchestrates: inventory check → persist → publish, strictly in
// that order. The inventory call runs through the circuit breaker; when the
// circuit is open or the call fails, the request is answered with a static
// fallback message and nothing is persisted or published.
//
// ============================================================================

/// Response body when the inventory dependency is unavailable.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again later!";

pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryClient>,
    publisher: Arc<dyn EventPublisher>,
    inventory_breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
    notification_topic: String,
    strict_validation: bool,
}

impl OrderService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryClient>,
        publisher: Arc<dyn EventPublisher>,
        inventory_breaker: CircuitBreaker,
        metrics: Arc<Metrics>,
        notification_topic: String,
        strict_validation: bool,
    ) -> Self {
        Self {
            repository,
            inventory,
            publisher,
            inventory_breaker,
            metrics,
            notification_topic,
            strict_validation,
        }
    }

    /// Place an order.
    ///
    /// Returns the confirmation string on success, the fallback string when
    /// inventory is unavailable, and an error when a SKU is out of stock or
    /// persistence fails.
    pub async fn place_order(&self, request: OrderRequest) -> Result<String, OrderServiceError> {
        if self.strict_validation {
            validate_request(&request)?;
        }

        let items = request.item_requests.into_iter().map(Into::into).collect();
        let order = Order::new(items);

        tracing::info!(order_number = %order.order_number, "Order number created");

        let sku_codes = order.sku_codes();

        // Breaker transitions and the state gauge are recorded by the
        // transition hook installed at construction time.
        let started = Instant::now();
        let check = self
            .inventory_breaker
            .call(self.inventory.check_stock(&sku_codes))
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        let statuses = match check {
            Ok(statuses) => {
                self.metrics.record_inventory_call("success", elapsed);
                statuses
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::warn!("Inventory circuit open, answering with fallback");
                self.metrics.record_inventory_call("short_circuit", elapsed);
                self.metrics.orders_fallback.inc();
                return Ok(FALLBACK_MESSAGE.to_string());
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::warn!(error = %e, "Inventory check failed, answering with fallback");
                self.metrics.record_inventory_call("failure", elapsed);
                self.metrics.orders_fallback.inc();
                return Ok(FALLBACK_MESSAGE.to_string());
            }
        };

        // Hard all-or-nothing gate: every reported SKU must be in stock.
        let all_in_stock = statuses.iter().all(|s| s.in_stock);
        if !all_in_stock {
            tracing::warn!(order_number = %order.order_number, "Rejecting order, SKU out of stock");
            self.metrics.orders_rejected_out_of_stock.inc();
            return Err(OrderServiceError::OutOfStock);
        }

        let saved = self.repository.save(order).await?;

        // Fire-and-forget: the order is already committed, so a publish
        // failure must not fail the request.
        if let Err(e) = self
            .publisher
            .publish(
                &self.notification_topic,
                &saved.order_number,
                &saved.order_number,
            )
            .await
        {
            tracing::warn!(
                error = %e,
                order_number = %saved.order_number,
                "Notification publish failed after commit"
            );
        }

        self.metrics.orders_placed.inc();
        tracing::info!(
            order_number = %saved.order_number,
            items = saved.items.len(),
            "Order created"
        );

        Ok(format!(
            "Order placed successfully. Order ID: {}",
            saved.order_number
        ))
    }
}

fn validate_request(request: &OrderRequest) -> Result<(), OrderServiceError> {
    for item in &request.item_requests {
        if item.sku_code.is_empty() {
            return Err(OrderServiceError::Validation(
                "skuCode must not be empty".to_string(),
            ));
        }
        if item.quantity <= 0 {
            return Err(OrderServiceError::Validation(format!(
                "quantity must be positive, got {}",
                item.quantity
            )));
        }
        if item.price.is_sign_negative() {
            return Err(OrderServiceError::Validation(format!(
                "price must not be negative, got {}",
                item.price
            )));
        }
    }
    Ok(())
}
