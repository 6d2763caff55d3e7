//! Failure isolation and retry policy for graph store operations.
//!
//! Composition per call: breaker gate → retry loop → operation. An
//! open-circuit rejection never consumes retry budget, and
//! non-retryable errors propagate on the first attempt.
//!
//! Breakers are explicit instances owned by [`Resilience`] (not module
//! globals) with a [`CircuitBreaker::reset`] hook so operators and test
//! harnesses can force one back to Closed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use haven_core::config::ResilienceConfig;
use haven_core::{HavenError, Result};

/// Breaker state machine positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation; failures are counted.
    Closed,
    /// Rejecting calls until the cool-down elapses.
    Open,
    /// Cool-down elapsed; exactly one trial call is in flight.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Per-category circuit breaker.
///
/// Counter increment, threshold check, and state change happen under
/// one lock; concurrent callers never observe a torn transition.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Whether a call may proceed. Promotes Open → HalfOpen once the
    /// cool-down has elapsed; the promotion itself grants the single
    /// half-open trial, so further callers are denied until the trial
    /// resolves.
    pub fn permit(&self) -> bool {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if cooled {
                    inner.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => false,
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.state = CircuitState::Closed;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            // Failed half-open trial: reopen and restart the cool-down.
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
            }
            _ => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
        }
    }

    /// Force the breaker back to Closed. Operator/test hook.
    pub fn reset(&self) {
        self.record_success();
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner
            .lock()
            .expect("breaker lock poisoned")
            .consecutive_failures
    }
}

/// Breaker registry plus retry policy, shared process-wide.
pub struct Resilience {
    config: ResilienceConfig,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl Resilience {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// The breaker for an operation category, created lazily.
    pub fn breaker(&self, category: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().expect("registry lock poisoned");
        breakers
            .entry(category.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    self.config.failure_threshold,
                    Duration::from_secs(self.config.cooldown_secs),
                ))
            })
            .clone()
    }

    /// Force a category's breaker back to Closed.
    pub fn reset(&self, category: &str) {
        self.breaker(category).reset();
    }

    /// Current state per known category, for health reporting.
    pub fn states(&self) -> Vec<(String, CircuitState)> {
        let breakers = self.breakers.lock().expect("registry lock poisoned");
        let mut states: Vec<_> = breakers
            .iter()
            .map(|(name, b)| (name.clone(), b.state()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    /// Run an operation under the category's breaker and the retry
    /// policy.
    ///
    /// Returns the operation's value, or: `CircuitOpen` when gated,
    /// the original error when non-retryable, `RetriesExhausted`
    /// wrapping the last failure once the budget is spent.
    pub async fn execute<T, F, Fut>(&self, category: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let breaker = self.breaker(category);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            if !breaker.permit() {
                tracing::warn!(category, "circuit open; rejecting without store call");
                return Err(HavenError::CircuitOpen {
                    category: category.to_string(),
                });
            }
            attempt += 1;

            match op().await {
                Ok(value) => {
                    breaker.record_success();
                    if attempt > 1 {
                        tracing::info!(category, attempt, "operation recovered after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    breaker.record_failure();
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    if attempt >= max_attempts {
                        tracing::error!(category, attempts = attempt, error = %err, "retry budget exhausted");
                        return Err(HavenError::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(err),
                        });
                    }
                    let delay = backoff_delay(attempt, &self.config);
                    tracing::warn!(
                        category,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Exponential backoff: base × 2^(attempt−1), capped.
fn backoff_delay(attempt: u32, config: &ResilienceConfig) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    let ms = config
        .base_delay_ms
        .saturating_mul(1u64 << shift)
        .min(config.max_delay_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn test_config() -> ResilienceConfig {
        ResilienceConfig {
            failure_threshold: 3,
            cooldown_secs: 30,
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }

    fn connection_err() -> HavenError {
        HavenError::Connection("connection refused".into())
    }

    #[test]
    fn test_backoff_schedule() {
        let config = test_config();
        assert_eq!(backoff_delay(1, &config), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, &config), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, &config), Duration::from_secs(4));
        assert_eq!(backoff_delay(5, &config), Duration::from_secs(16));
        // Capped by max_delay_ms.
        assert_eq!(backoff_delay(10, &config), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_trips_after_threshold() {
        let resilience = Resilience::new(ResilienceConfig {
            max_attempts: 1,
            ..test_config()
        });
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let result: Result<()> = resilience
                .execute("neo4j-query", move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(connection_err())
                    }
                })
                .await;
            assert!(result.is_err());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            resilience.breaker("neo4j-query").state(),
            CircuitState::Open
        );

        // Next call rejected without touching the operation.
        let calls2 = calls.clone();
        let result: Result<()> = resilience
            .execute("neo4j-query", move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        assert!(matches!(result, Err(HavenError::CircuitOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_success_closes() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));
        for _ in 0..3 {
            assert!(breaker.permit());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.permit());

        tokio::time::advance(Duration::from_secs(31)).await;

        // Exactly one trial after cool-down.
        assert!(breaker.permit());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.permit());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_failure_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(30));
        assert!(breaker.permit());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(breaker.permit());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        // Cool-down restarted: still rejecting.
        assert!(!breaker.permit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exact_invocation_count() {
        let resilience = Resilience::new(test_config());
        let calls = Arc::new(AtomicU32::new(0));

        // Fails 4 times, succeeds on the 5th; budget is 5.
        let calls_op = calls.clone();
        let result = resilience
            .execute("neo4j-query", move || {
                let calls = calls_op.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 5 {
                        Err(connection_err())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_wraps_last_error() {
        let resilience = Resilience::new(ResilienceConfig {
            max_attempts: 3,
            // Threshold above attempts so the breaker stays closed.
            failure_threshold: 10,
            ..test_config()
        });
        let calls = Arc::new(AtomicU32::new(0));

        let calls_op = calls.clone();
        let result: Result<()> = resilience
            .execute("neo4j-query", move || {
                let calls = calls_op.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(connection_err())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(HavenError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, HavenError::Connection(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_propagates_immediately() {
        let resilience = Resilience::new(test_config());
        let calls = Arc::new(AtomicU32::new(0));

        let calls_op = calls.clone();
        let result: Result<()> = resilience
            .execute("neo4j-query", move || {
                let calls = calls_op.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(HavenError::Query("syntax error".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(HavenError::Query(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_hook_closes_breaker() {
        let resilience = Resilience::new(test_config());
        let breaker = resilience.breaker("neo4j-connect");
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        resilience.reset("neo4j-connect");
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);

        let result = resilience
            .execute("neo4j-connect", || async { Ok(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_states_reports_all_categories() {
        let resilience = Resilience::new(test_config());
        resilience.breaker("neo4j-connect");
        let query_breaker = resilience.breaker("neo4j-query");
        for _ in 0..3 {
            query_breaker.record_failure();
        }

        let states = resilience.states();
        assert_eq!(
            states,
            vec![
                ("neo4j-connect".to_string(), CircuitState::Closed),
                ("neo4j-query".to_string(), CircuitState::Open),
            ]
        );
    }
}
