//! Rate-governed execution gate for outbound API calls
//!
//! A token bucket with continuous refill serializes every LLM and registry
//! call behind a process-wide request budget. The bucket state lives under a
//! single mutex; waiters poll with short sleeps taken outside the lock so a
//! sleeping acquirer never blocks the others.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

/// Default deadline for waiting on a token.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(120);

/// Caller-declared urgency of a gated call.
///
/// Accepted and recorded, but waiters are not reordered by it: all callers
/// compete fairly for tokens via independent polling. Reserved for
/// preferential scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// Interactive analysis driven by a waiting user.
    Critical = 0,
    /// Primary collection agents.
    High = 1,
    /// Evidence gathering.
    #[default]
    Normal = 2,
    /// Background enrichment.
    Low = 3,
}

#[derive(Debug, Error)]
pub enum GateError<E> {
    #[error("rate limit: timed out after {timeout:?} waiting for a token")]
    AcquireTimeout { timeout: Duration },
    #[error(transparent)]
    Action(E),
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket with continuous (non-discretized) refill.
pub struct TokenBucket {
    max_tokens: f64,
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(max_tokens: u32, refill_interval: Duration) -> Self {
        Self {
            max_tokens: f64::from(max_tokens),
            refill_interval,
            state: Mutex::new(BucketState {
                tokens: f64::from(max_tokens),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Refill must be called with the lock held. Monotonic in elapsed time;
    /// tokens never exceed max_tokens.
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        let added = elapsed * self.max_tokens / self.refill_interval.as_secs_f64();
        state.tokens = (state.tokens + added).min(self.max_tokens);
        state.last_refill = now;
    }

    /// Try to take one token, blocking up to `timeout`. Returns false on
    /// deadline expiry; never panics or errors.
    pub fn acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            {
                let mut state = self.state.lock().expect("bucket lock poisoned");
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return true;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            // Sleep roughly the time it takes to generate one token, but
            // never past the deadline. Taken outside the lock.
            let one_token = self.refill_interval.div_f64(self.max_tokens);
            let wait = one_token.min(deadline - now);
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }
    }

    /// Tokens available right now (refill-on-read).
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock().expect("bucket lock poisoned");
        self.refill(&mut state);
        state.tokens
    }
}

/// Gate statistics, accumulated for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct GateStats {
    pub total_requests: u64,
    pub total_errors: u64,
    pub avg_wait_seconds: f64,
    pub available_tokens: f64,
    /// Requests per priority level, indexed Critical..Low.
    pub requests_by_priority: [u64; 4],
}

/// Priority-aware execution gate every outbound call must pass through.
pub struct CallGate {
    bucket: TokenBucket,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    total_wait_micros: AtomicU64,
    by_priority: [AtomicU64; 4],
}

impl CallGate {
    /// Gate allowing `rpm` requests per minute.
    pub fn new(rpm: u32) -> Self {
        Self::with_bucket(TokenBucket::new(rpm, Duration::from_secs(60)))
    }

    pub fn with_bucket(bucket: TokenBucket) -> Self {
        Self {
            bucket,
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            total_wait_micros: AtomicU64::new(0),
            by_priority: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
        }
    }

    /// Run `action` once a token is available. The wait time and one request
    /// are recorded regardless of outcome; an action error is counted and
    /// re-raised to the caller, who decides whether it is fatal.
    pub fn execute<T, E, F>(
        &self,
        priority: Priority,
        timeout: Duration,
        action: F,
    ) -> Result<T, GateError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let start = Instant::now();

        if !self.bucket.acquire(timeout) {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
            return Err(GateError::AcquireTimeout { timeout });
        }

        let waited = start.elapsed();
        self.total_wait_micros
            .fetch_add(waited.as_micros() as u64, Ordering::Relaxed);
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.by_priority[priority as usize].fetch_add(1, Ordering::Relaxed);
        trace!(?priority, waited_ms = waited.as_millis() as u64, "token acquired");

        match action() {
            Ok(value) => Ok(value),
            Err(e) => {
                self.total_errors.fetch_add(1, Ordering::Relaxed);
                Err(GateError::Action(e))
            }
        }
    }

    pub fn stats(&self) -> GateStats {
        let requests = self.total_requests.load(Ordering::Relaxed);
        let wait_micros = self.total_wait_micros.load(Ordering::Relaxed);
        GateStats {
            total_requests: requests,
            total_errors: self.total_errors.load(Ordering::Relaxed),
            avg_wait_seconds: if requests > 0 {
                wait_micros as f64 / 1_000_000.0 / requests as f64
            } else {
                0.0
            },
            available_tokens: self.bucket.available(),
            requests_by_priority: [
                self.by_priority[0].load(Ordering::Relaxed),
                self.by_priority[1].load(Ordering::Relaxed),
                self.by_priority[2].load(Ordering::Relaxed),
                self.by_priority[3].load(Ordering::Relaxed),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_up_to_capacity_is_immediate() {
        let bucket = TokenBucket::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..5 {
            assert!(bucket.acquire(Duration::from_millis(50)));
        }
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn test_exhausted_bucket_times_out() {
        let bucket = TokenBucket::new(1, Duration::from_secs(600));
        assert!(bucket.acquire(Duration::from_millis(10)));
        // One token per 600s: a 30ms deadline can never be met.
        assert!(!bucket.acquire(Duration::from_millis(30)));
    }

    #[test]
    fn test_refill_is_capped_at_max() {
        let bucket = TokenBucket::new(3, Duration::from_millis(30));
        for _ in 0..3 {
            assert!(bucket.acquire(Duration::from_millis(5)));
        }
        std::thread::sleep(Duration::from_millis(120));
        assert!(bucket.available() <= 3.0);
    }

    #[test]
    fn test_execute_counts_action_errors_and_reraises() {
        let gate = CallGate::new(10);
        let result: Result<(), GateError<std::io::Error>> =
            gate.execute(Priority::Normal, Duration::from_secs(1), || {
                Err(std::io::Error::other("boom"))
            });
        assert!(matches!(result, Err(GateError::Action(_))));

        let stats = gate.stats();
        // The request was admitted (and recorded) before the action failed.
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.total_errors, 1);
    }

    #[test]
    fn test_execute_timeout_is_an_explicit_failure() {
        let gate = CallGate::with_bucket(TokenBucket::new(1, Duration::from_secs(600)));
        let ok: Result<u32, GateError<std::io::Error>> =
            gate.execute(Priority::High, Duration::from_secs(1), || Ok(1));
        assert_eq!(ok.unwrap(), 1);

        let timed_out: Result<u32, GateError<std::io::Error>> =
            gate.execute(Priority::High, Duration::from_millis(20), || Ok(2));
        assert!(matches!(timed_out, Err(GateError::AcquireTimeout { .. })));

        let stats = gate.stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.requests_by_priority[Priority::High as usize], 1);
    }

    #[test]
    fn test_concurrent_acquirers_all_succeed_eventually() {
        use std::sync::Arc;

        let gate = Arc::new(CallGate::with_bucket(TokenBucket::new(
            4,
            Duration::from_millis(200),
        )));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || {
                    let r: Result<(), GateError<std::io::Error>> =
                        gate.execute(Priority::Normal, Duration::from_secs(5), || Ok(()));
                    r.is_ok()
                })
            })
            .collect();

        assert!(handles.into_iter().all(|h| h.join().unwrap()));
        assert_eq!(gate.stats().total_requests, 8);
    }
}
