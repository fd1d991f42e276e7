//! Client-side request rate limiter for the place provider.
//!
//! Tracks two sliding windows, one second and one day. Callers wait for the
//! per-second window, but only up to a bound; a full daily window fails at
//! once with [`PlacesError::QuotaExceeded`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::PlacesError;

const SECOND: Duration = Duration::from_secs(1);
const DAY: Duration = Duration::from_secs(86_400);

#[derive(Debug)]
struct Window {
    span: Duration,
    limit: usize,
    stamps: VecDeque<Instant>,
}

impl Window {
    fn new(span: Duration, limit: u32) -> Self {
        Self {
            span,
            limit: limit.max(1) as usize,
            stamps: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.stamps.front() {
            if now.duration_since(oldest) >= self.span {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until a slot frees up, zero if one is free now.
    fn wait_time(&self, now: Instant) -> Duration {
        if self.stamps.len() < self.limit {
            return Duration::ZERO;
        }
        self.stamps
            .front()
            .map(|&oldest| self.span.saturating_sub(now.duration_since(oldest)))
            .unwrap_or(Duration::ZERO)
    }
}

/// Sliding-window limiter shared by all requests of one client.
#[derive(Debug)]
pub struct RequestRateLimiter {
    windows: Mutex<(Window, Window)>,
    max_wait: Duration,
}

impl RequestRateLimiter {
    /// `max_wait` caps the total time one caller may spend waiting for a
    /// slot; it is normally the outbound request timeout.
    pub fn new(per_second: u32, per_day: u32, max_wait: Duration) -> Self {
        Self {
            windows: Mutex::new((Window::new(SECOND, per_second), Window::new(DAY, per_day))),
            max_wait,
        }
    }

    /// Reserve a slot, sleeping while the per-second window is full.
    pub async fn acquire(&self) -> Result<(), PlacesError> {
        let deadline = Instant::now() + self.max_wait;
        loop {
            let now = Instant::now();
            let wait = self.try_reserve(now)?;
            if wait.is_zero() {
                return Ok(());
            }
            if now + wait > deadline {
                tracing::warn!(
                    wait_ms = wait.as_millis() as u64,
                    max_wait_ms = self.max_wait.as_millis() as u64,
                    "Place search rate limit wait exceeds bound"
                );
                return Err(PlacesError::QuotaExceeded(
                    "client request rate limit reached".to_string(),
                ));
            }
            tracing::info!(wait_ms = wait.as_millis() as u64, "Place search rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Record a request at `now` if both windows have room; otherwise return
    /// how long the per-second window needs. A full daily window is an
    /// error. The lock is never held across an await.
    fn try_reserve(&self, now: Instant) -> Result<Duration, PlacesError> {
        let mut guard = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (second, day) = &mut *guard;
        second.prune(now);
        day.prune(now);

        let day_wait = day.wait_time(now);
        if !day_wait.is_zero() {
            tracing::warn!(
                limit = day.limit,
                reset_in_secs = day_wait.as_secs(),
                "Daily place search limit reached"
            );
            return Err(PlacesError::QuotaExceeded(format!(
                "daily limit of {} requests reached",
                day.limit
            )));
        }

        let wait = second.wait_time(now);
        if wait.is_zero() {
            second.stamps.push_back(now);
            day.stamps.push_back(now);
        }
        Ok(wait)
    }
}
