//! Token-bucket rate limiter for outbound provider calls.

use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Inner {
    tokens: f64,
    last_refill: Instant,
}

/// Per-provider rate limiter. Refills continuously at `refill_per_sec`,
/// capped at `capacity`.
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    inner: Mutex<Inner>,
}

impl TokenBucket {
    /// A full bucket of `capacity` tokens, refilling at `refill_per_sec`
    /// tokens/second.
    #[must_use]
    pub fn new(capacity: u32, refill_per_sec: u32) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec: f64::from(refill_per_sec),
            inner: Mutex::new(Inner {
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, inner: &mut Inner) {
        let elapsed = inner.last_refill.elapsed().as_secs_f64();
        inner.tokens = (inner.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        inner.last_refill = Instant::now();
    }

    /// Attempt to take one token. Returns `true` if granted.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        self.refill(&mut inner);
        if inner.tokens >= 1.0 {
            inner.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Block until a token is available.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
