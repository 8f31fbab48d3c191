use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod errors;
mod inventory;
mod messaging;
mod metrics;
mod models;
mod repository;
mod service;
mod utils;

use api::AppState;
use config::Config;
use inventory::HttpInventoryClient;
use messaging::KafkaEventPublisher;
use repository::PostgresOrderRepository;
use service::OrderService;
use utils::CircuitBreaker;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting order-service on {}", config.bind_addr);

    // === 1. Postgres pool + schema ===
    tracing::info!("Connecting to Postgres...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // === 2. Metrics registry ===
    let metrics = Arc::new(metrics::Metrics::new()?);

    // === 3. Collaborators ===
    let repository = Arc::new(PostgresOrderRepository::new(pool));
    let inventory = Arc::new(HttpInventoryClient::new(
        &config.inventory_base_url,
        config.inventory_timeout,
    )?);
    let publisher = Arc::new(KafkaEventPublisher::new(&config.kafka_brokers)?);
    let inventory_breaker = CircuitBreaker::new(config.circuit_breaker.clone())
        .with_transition_hook({
            let metrics = metrics.clone();
            move |from, to| {
                metrics.record_circuit_breaker_transition(from, to);
                metrics.update_circuit_breaker_state(to);
            }
        });

    // === 4. Workflow + HTTP server ===
    let service = Arc::new(OrderService::new(
        repository,
        inventory,
        publisher,
        inventory_breaker,
        metrics.clone(),
        config.notification_topic.clone(),
        config.strict_validation,
    ));

    let state = web::Data::new(AppState { service, metrics });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
