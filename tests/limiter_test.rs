//! Integration tests for the rate-governed call gate
//!
//! Timing assertions keep generous margins to stay reliable on loaded CI
//! machines.

use agroscout::limiter::{CallGate, GateError, Priority, TokenBucket};
use std::time::{Duration, Instant};

#[test]
fn burst_of_capacity_succeeds_immediately_then_waits() {
    // max_tokens=2, refill_interval=600ms: one token regenerates every 300ms.
    let bucket = TokenBucket::new(2, Duration::from_millis(600));

    let start = Instant::now();
    assert!(bucket.acquire(Duration::from_secs(5)));
    assert!(bucket.acquire(Duration::from_secs(5)));
    assert!(start.elapsed() < Duration::from_millis(100));

    // The (N+1)-th acquire must wait at least T/N.
    let wait_start = Instant::now();
    assert!(bucket.acquire(Duration::from_secs(5)));
    assert!(
        wait_start.elapsed() >= Duration::from_millis(250),
        "third token arrived too early: {:?}",
        wait_start.elapsed()
    );
}

#[test]
fn acquire_returns_false_on_deadline_not_panic() {
    let bucket = TokenBucket::new(1, Duration::from_secs(3600));
    assert!(bucket.acquire(Duration::from_millis(10)));
    assert!(!bucket.acquire(Duration::from_millis(50)));
}

#[test]
fn gate_records_wait_and_requests_regardless_of_outcome() {
    let gate = CallGate::new(600); // plenty of tokens

    let ok: Result<u32, GateError<std::io::Error>> =
        gate.execute(Priority::Critical, Duration::from_secs(1), || Ok(7));
    assert_eq!(ok.unwrap(), 7);

    let err: Result<u32, GateError<std::io::Error>> =
        gate.execute(Priority::Low, Duration::from_secs(1), || {
            Err(std::io::Error::other("provider exploded"))
        });
    assert!(matches!(err, Err(GateError::Action(_))));

    let stats = gate.stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_errors, 1);
    assert_eq!(stats.requests_by_priority[Priority::Critical as usize], 1);
    assert_eq!(stats.requests_by_priority[Priority::Low as usize], 1);
    assert!(stats.available_tokens > 0.0);
}

#[test]
fn concurrent_callers_share_one_budget_fairly() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let gate = Arc::new(CallGate::with_bucket(TokenBucket::new(
        5,
        Duration::from_millis(250),
    )));
    let completed = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let completed = Arc::clone(&completed);
            std::thread::spawn(move || {
                let result: Result<(), GateError<std::io::Error>> =
                    gate.execute(Priority::Normal, Duration::from_secs(10), || Ok(()));
                if result.is_ok() {
                    completed.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Eventual fairness: every caller got through within the deadline.
    assert_eq!(completed.load(Ordering::Relaxed), 10);
    assert_eq!(gate.stats().total_requests, 10);
}

#[test]
fn available_tokens_refill_on_read() {
    let bucket = TokenBucket::new(4, Duration::from_millis(200));
    for _ in 0..4 {
        assert!(bucket.acquire(Duration::from_secs(1)));
    }
    assert!(bucket.available() < 1.0);

    std::thread::sleep(Duration::from_millis(300));
    let available = bucket.available();
    assert!(
        available > 3.0 && available <= 4.0,
        "expected a refilled bucket, got {available}"
    );
}
