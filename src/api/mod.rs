use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use prometheus::{Encoder, TextEncoder};

use crate::errors::OrderServiceError;
use crate::metrics::Metrics;
use crate::models::OrderRequest;
use crate::service::OrderService;

// ============================================================================
// HTTP API
// ============================================================================
//
// POST /api/orders — place an order, plain-string response body
// GET  /health     — liveness probe
// GET  /metrics    — Prometheus text exposition
//
// ============================================================================

pub struct AppState {
    pub service: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/orders", web::post().to(place_order))
        .route("/health", web::get().to(health_handler))
        .route("/metrics", web::get().to(metrics_handler));
}

async fn place_order(
    state: web::Data<AppState>,
    request: web::Json<OrderRequest>,
) -> Result<HttpResponse, OrderServiceError> {
    let reply = state.service.place_order(request.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(reply))
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "order-service"
    }))
}

async fn metrics_handler(state: web::Data<AppState>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

impl ResponseError for OrderServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderServiceError::OutOfStock => StatusCode::CONFLICT,
            OrderServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage details stay in the log; the response body must not leak
        // database internals.
        if let OrderServiceError::Storage(e) = self {
            tracing::error!(error = %e, "Order persistence failed");
            return HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body("Internal server error");
        }

        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}
