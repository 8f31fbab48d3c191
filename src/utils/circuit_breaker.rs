use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// ============================================================================
// Circuit Breaker Pattern Implementation
// ============================================================================
//
// Protects a downstream dependency by tracking the failure rate of recent
// calls and short-circuiting requests while the dependency is unhealthy.
//
// States:
// - Closed: normal operation, outcomes recorded in a sliding window
// - Open: failure rate crossed the threshold, calls rejected immediately
// - HalfOpen: after the cool-down, a bounded number of trial calls probe
//   recovery; one failed trial reopens the circuit
//
// The state is process-wide and shared across all concurrent callers of the
// same dependency.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Number of recent call outcomes kept in the sliding window.
    pub window_size: usize,
    /// Minimum outcomes in the window before the failure rate is evaluated.
    pub min_calls: usize,
    /// Failure rate (0.0..=1.0) at which the circuit opens.
    pub failure_rate_threshold: f64,
    /// Cool-down before an open circuit admits trial calls.
    pub open_duration: Duration,
    /// Trial calls admitted while half-open; that many successes close the
    /// circuit, one failure reopens it.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_calls: 5,
            failure_rate_threshold: 0.5,
            open_duration: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }
}

struct CircuitBreakerState {
    state: CircuitState,
    /// Sliding window of outcomes, `true` meaning failure.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_in_flight: u32,
    half_open_successes: u32,
}

type TransitionHook = Arc<dyn Fn(CircuitState, CircuitState) + Send + Sync>;

#[derive(Clone)]
pub struct CircuitBreaker {
    state: Arc<Mutex<CircuitBreakerState>>,
    config: CircuitBreakerConfig,
    on_transition: Option<TransitionHook>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(CircuitBreakerState {
                state: CircuitState::Closed,
                window: VecDeque::new(),
                opened_at: None,
                half_open_in_flight: 0,
                half_open_successes: 0,
            })),
            config,
            on_transition: None,
        }
    }

    /// Install a hook invoked on every state transition, including the
    /// short-lived half-open excursions a caller polling `get_state` between
    /// calls would never observe.
    pub fn with_transition_hook(
        mut self,
        hook: impl Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    ) -> Self {
        self.on_transition = Some(Arc::new(hook));
        self
    }

    fn notify(&self, from: CircuitState, to: CircuitState) {
        if let Some(hook) = &self.on_transition {
            hook(from, to);
        }
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// Rejected calls return `CircuitOpen` without running the future.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        self.acquire_permit().await?;

        match operation.await {
            Ok(result) => {
                self.record_success().await;
                Ok(result)
            }
            Err(err) => {
                self.record_failure().await;
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    async fn acquire_permit<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        let mut state = self.state.lock().await;

        match state.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed = state
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.config.open_duration {
                    tracing::info!("Circuit breaker transitioning to HalfOpen");
                    state.state = CircuitState::HalfOpen;
                    state.half_open_in_flight = 1;
                    state.half_open_successes = 0;
                    self.notify(CircuitState::Open, CircuitState::HalfOpen);
                    Ok(())
                } else {
                    Err(CircuitBreakerError::CircuitOpen)
                }
            }
            CircuitState::HalfOpen => {
                if state.half_open_in_flight + state.half_open_successes
                    >= self.config.half_open_max_calls
                {
                    // Trial budget exhausted, treat as still open.
                    Err(CircuitBreakerError::CircuitOpen)
                } else {
                    state.half_open_in_flight += 1;
                    Ok(())
                }
            }
        }
    }

    async fn record_success(&self) {
        let mut state = self.state.lock().await;

        match state.state {
            CircuitState::Closed => {
                push_outcome(&mut state.window, false, self.config.window_size);
            }
            CircuitState::HalfOpen => {
                state.half_open_in_flight = state.half_open_in_flight.saturating_sub(1);
                state.half_open_successes += 1;
                if state.half_open_successes >= self.config.half_open_max_calls {
                    tracing::info!(
                        successes = state.half_open_successes,
                        "Circuit breaker closing after successful trials"
                    );
                    state.state = CircuitState::Closed;
                    state.window.clear();
                    state.opened_at = None;
                    state.half_open_in_flight = 0;
                    state.half_open_successes = 0;
                    self.notify(CircuitState::HalfOpen, CircuitState::Closed);
                }
            }
            CircuitState::Open => {
                // A call admitted before the circuit opened finished late.
            }
        }
    }

    async fn record_failure(&self) {
        let mut state = self.state.lock().await;

        match state.state {
            CircuitState::Closed => {
                push_outcome(&mut state.window, true, self.config.window_size);

                if state.window.len() >= self.config.min_calls {
                    let failures = state.window.iter().filter(|f| **f).count();
                    let rate = failures as f64 / state.window.len() as f64;
                    if rate >= self.config.failure_rate_threshold {
                        tracing::warn!(
                            failure_rate = rate,
                            window = state.window.len(),
                            "Circuit breaker opening"
                        );
                        state.state = CircuitState::Open;
                        state.opened_at = Some(Instant::now());
                        state.window.clear();
                        self.notify(CircuitState::Closed, CircuitState::Open);
                    }
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!("Failure during half-open, reopening circuit");
                state.state = CircuitState::Open;
                state.opened_at = Some(Instant::now());
                state.half_open_in_flight = 0;
                state.half_open_successes = 0;
                self.notify(CircuitState::HalfOpen, CircuitState::Open);
            }
            CircuitState::Open => {
                state.opened_at = Some(Instant::now());
            }
        }
    }

    pub async fn get_state(&self) -> CircuitState {
        let state = self.state.lock().await;
        state.state
    }

    /// Manually reset the circuit breaker.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        tracing::info!("Circuit breaker manually reset");
        let previous = state.state;
        state.state = CircuitState::Closed;
        state.window.clear();
        state.opened_at = None;
        state.half_open_in_flight = 0;
        state.half_open_successes = 0;
        if previous != CircuitState::Closed {
            self.notify(previous, CircuitState::Closed);
        }
    }
}

fn push_outcome(window: &mut VecDeque<bool>, failed: bool, capacity: usize) {
    if window.len() == capacity {
        window.pop_front();
    }
    window.push_back(failed);
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    CircuitOpen,
    OperationFailed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitBreakerError::CircuitOpen => write!(f, "Circuit breaker is open"),
            CircuitBreakerError::OperationFailed(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error> std::error::Error for CircuitBreakerError<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            window_size: 4,
            min_calls: 4,
            failure_rate_threshold: 0.5,
            open_duration: Duration::from_millis(100),
            half_open_max_calls: 2,
        }
    }

    #[tokio::test]
    async fn test_opens_when_failure_rate_crosses_threshold() {
        let cb = CircuitBreaker::new(fast_config());

        // Two successes, two failures: rate 0.5 at window of 4.
        for _ in 0..2 {
            let _ = cb.call(async { Ok::<_, &str>(()) }).await;
        }
        for _ in 0..2 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }

        assert_eq!(cb.get_state().await, CircuitState::Open);

        // Next call short-circuits without running.
        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn test_stays_closed_below_min_calls() {
        let cb = CircuitBreaker::new(fast_config());

        // Three failures: 100% rate but below min_calls.
        for _ in 0..3 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }

        assert_eq!(cb.get_state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_closes_after_successful_trials() {
        let cb = CircuitBreaker::new(fast_config());

        for _ in 0..4 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }
        assert_eq!(cb.get_state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(150)).await;

        // Two successful trials close the circuit.
        for _ in 0..2 {
            let result = cb.call(async { Ok::<_, &str>(()) }).await;
            assert!(result.is_ok());
        }

        assert_eq!(cb.get_state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_failed_trial_reopens_circuit() {
        let cb = CircuitBreaker::new(fast_config());

        for _ in 0..4 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }

        tokio::time::sleep(Duration::from_millis(150)).await;

        let _ = cb.call(async { Err::<(), _>("still down") }).await;
        assert_eq!(cb.get_state().await, CircuitState::Open);

        // And the cool-down starts over.
        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn test_window_slides_old_failures_out() {
        let cb = CircuitBreaker::new(fast_config());

        for _ in 0..2 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }
        // Four successes push the failures out of the window.
        for _ in 0..4 {
            let _ = cb.call(async { Ok::<_, &str>(()) }).await;
        }
        let _ = cb.call(async { Err::<(), _>("error") }).await;

        // One failure in a window of four stays below the 0.5 threshold.
        assert_eq!(cb.get_state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_transition_hook_records_half_open_excursion() {
        let transitions = Arc::new(std::sync::Mutex::new(Vec::new()));
        let cb = CircuitBreaker::new(fast_config()).with_transition_hook({
            let transitions = transitions.clone();
            move |from, to| transitions.lock().unwrap().push((from, to))
        });

        for _ in 0..4 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }

        tokio::time::sleep(Duration::from_millis(150)).await;

        // One failed trial: the circuit is Open both before and after the
        // call, but the hook still sees both legs of the excursion.
        let _ = cb.call(async { Err::<(), _>("still down") }).await;

        assert_eq!(
            *transitions.lock().unwrap(),
            vec![
                (CircuitState::Closed, CircuitState::Open),
                (CircuitState::Open, CircuitState::HalfOpen),
                (CircuitState::HalfOpen, CircuitState::Open),
            ]
        );
    }

    #[tokio::test]
    async fn test_reset_returns_to_closed() {
        let cb = CircuitBreaker::new(fast_config());

        for _ in 0..4 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }
        assert_eq!(cb.get_state().await, CircuitState::Open);

        cb.reset().await;
        assert_eq!(cb.get_state().await, CircuitState::Closed);

        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(result.is_ok());
    }
}
