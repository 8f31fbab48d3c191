// ============================================================================
// Error taxonomy
// ============================================================================
//
// One enum per collaborator boundary plus the workflow-level error the API
// layer maps onto HTTP statuses.
//
// ============================================================================

/// Failures talking to the inventory service.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory request failed: {0}")]
    Transport(String),

    #[error("inventory service returned status {0}")]
    Status(u16),

    #[error("could not decode inventory response: {0}")]
    Decode(String),
}

/// Failures publishing a notification event.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event publish failed: {0}")]
    Broker(String),
}

/// Failures persisting an order.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors surfaced by the order workflow.
///
/// Downstream-unavailable is deliberately absent: the circuit breaker routes
/// that case to the fallback response, which is a successful reply.
#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error("Product is not in stock")]
    OutOfStock,

    #[error("invalid order request: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
