use std::time::Duration;

use anyhow::Context;

use crate::utils::CircuitBreakerConfig;

// ============================================================================
// Configuration
// ============================================================================
//
// Everything comes from the environment, with defaults suitable for local
// runs against docker-compose. Only DATABASE_URL is mandatory.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    pub database_url: String,
    pub kafka_brokers: String,
    /// Topic the order number is published to after a successful commit.
    pub notification_topic: String,
    pub inventory_base_url: String,
    /// Upper bound on a single inventory call.
    pub inventory_timeout: Duration,
    /// When enabled, reject empty SKUs, non-positive quantities and negative
    /// prices. Off by default: the workflow passes requests through as-is.
    pub strict_validation: bool,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: env_or("ORDER_SERVICE_BIND", "0.0.0.0:8080"),
            database_url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            kafka_brokers: env_or("KAFKA_BROKERS", "127.0.0.1:9092"),
            notification_topic: env_or("NOTIFICATION_TOPIC", "notificationTopic"),
            inventory_base_url: env_or("INVENTORY_SERVICE_URL", "http://inventory-service"),
            inventory_timeout: Duration::from_millis(parse_env("INVENTORY_TIMEOUT_MS", 3_000)?),
            strict_validation: parse_env("STRICT_VALIDATION", false)?,
            circuit_breaker: CircuitBreakerConfig {
                window_size: parse_env("CB_WINDOW_SIZE", 10)?,
                min_calls: parse_env("CB_MIN_CALLS", 5)?,
                failure_rate_threshold: parse_env("CB_FAILURE_RATE", 0.5)?,
                open_duration: Duration::from_millis(parse_env("CB_OPEN_MS", 30_000)?),
                half_open_max_calls: parse_env("CB_HALF_OPEN_CALLS", 3)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default() {
        assert_eq!(env_or("ORDER_SERVICE_TEST_UNSET", "fallback"), "fallback");
    }

    #[test]
    fn parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("ORDER_SERVICE_TEST_UNSET_U64", 3_000).unwrap();
        assert_eq!(value, 3_000);
    }

    #[test]
    fn parse_env_rejects_garbage() {
        std::env::set_var("ORDER_SERVICE_TEST_GARBAGE", "not-a-number");
        let result: anyhow::Result<u64> = parse_env("ORDER_SERVICE_TEST_GARBAGE", 0);
        assert!(result.is_err());
        std::env::remove_var("ORDER_SERVICE_TEST_GARBAGE");
    }
}
