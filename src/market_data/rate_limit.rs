// =============================================================================
// Rate Limiter — keeps market data requests inside the provider's quota
// =============================================================================
//
// Alpha Vantage's free tier allows 5 requests per minute. The limiter counts
// requests in a fixed window with a single atomic word that any task may
// touch lock-free. A request over budget is refused immediately instead of
// queued; the caller reports the ticker as unavailable. Background work that
// can afford to wait asks `wait_for` first.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Fixed-window request budget. Window start (seconds, high 32 bits) and the
/// slots used in it (low 32 bits) share one atomic word, so a window reset and
/// a reservation can never interleave.
pub struct RateLimiter {
    /// `0` disables limiting.
    max_per_window: u32,
    window_secs: u64,
    state: AtomicU64,
}

/// Immutable snapshot of the limiter (suitable for the health payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub used: u32,
    pub max_per_window: u32,
    pub window_secs: u64,
}

fn pack(window_started: u64, used: u32) -> u64 {
    (window_started << 32) | u64::from(used)
}

fn unpack(state: u64) -> (u64, u32) {
    (state >> 32, state as u32)
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window_secs: u64) -> Self {
        Self {
            max_per_window,
            window_secs: window_secs.max(1),
            state: AtomicU64::new(0),
        }
    }

    /// `max_per_minute` requests per 60 s.
    pub fn per_minute(max_per_minute: u32) -> Self {
        Self::new(max_per_minute, 60)
    }

    /// Reserve one request slot. Returns `false` when the window is spent.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(now_secs())
    }

    fn try_acquire_at(&self, now: u64) -> bool {
        if self.max_per_window == 0 {
            return true;
        }

        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let (started, used) = self.live_window(current, now);
            if used >= self.max_per_window {
                warn!(
                    used,
                    limit = self.max_per_window,
                    window_secs = self.window_secs,
                    "request blocked — provider rate limit reached"
                );
                return false;
            }

            match self.state.compare_exchange_weak(
                current,
                pack(started, used + 1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if used == 0 {
                        debug!(window_started = started, "rate-limit window opened");
                    }
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// How long to wait before `slots` requests fit in the budget. `None`
    /// when they fit now. Requests beyond the whole budget wait for a fresh
    /// window.
    pub fn wait_for(&self, slots: u32) -> Option<Duration> {
        self.wait_for_at(slots, now_secs())
    }

    fn wait_for_at(&self, slots: u32, now: u64) -> Option<Duration> {
        if self.max_per_window == 0 {
            return None;
        }
        let (started, used) = self.live_window(self.state.load(Ordering::Acquire), now);
        if used.saturating_add(slots.min(self.max_per_window)) <= self.max_per_window {
            return None;
        }
        let remaining = (started + self.window_secs).saturating_sub(now).max(1);
        Some(Duration::from_secs(remaining))
    }

    /// Window start and slots used as of `now`; an expired window reads as
    /// a fresh one starting at `now`.
    fn live_window(&self, state: u64, now: u64) -> (u64, u32) {
        let (started, used) = unpack(state);
        if now.saturating_sub(started) >= self.window_secs {
            (now, 0)
        } else {
            (started, used)
        }
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        self.snapshot_at(now_secs())
    }

    fn snapshot_at(&self, now: u64) -> RateLimitSnapshot {
        let (_, used) = self.live_window(self.state.load(Ordering::Relaxed), now);
        RateLimitSnapshot {
            used,
            max_per_window: self.max_per_window,
            window_secs: self.window_secs,
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("used", &unpack(self.state.load(Ordering::Relaxed)).1)
            .field("max_per_window", &self.max_per_window)
            .field("window_secs", &self.window_secs)
            .finish()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_enforced_within_window() {
        let rl = RateLimiter::new(3, 60);
        assert!(rl.try_acquire_at(1_000));
        assert!(rl.try_acquire_at(1_001));
        assert!(rl.try_acquire_at(1_002));
        assert!(!rl.try_acquire_at(1_003));
        assert_eq!(rl.snapshot_at(1_003).used, 3);
        assert_eq!(rl.snapshot_at(1_060).used, 0);
    }

    #[test]
    fn window_rolls_over() {
        let rl = RateLimiter::new(1, 60);
        assert!(rl.try_acquire_at(1_000));
        assert!(!rl.try_acquire_at(1_059));
        assert!(rl.try_acquire_at(1_060));
    }

    #[test]
    fn concurrent_acquires_never_overrun_budget() {
        let rl = std::sync::Arc::new(RateLimiter::new(50, 3_600));
        let granted = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let rl = rl.clone();
                let granted = granted.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if rl.try_acquire() {
                            granted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(granted.load(Ordering::Relaxed), 50);
    }

    #[test]
    fn wait_for_reports_time_to_next_window() {
        let rl = RateLimiter::new(2, 60);
        assert_eq!(rl.wait_for_at(2, 1_000), None);
        assert!(rl.try_acquire_at(1_000));
        assert_eq!(rl.wait_for_at(1, 1_010), None);
        assert_eq!(rl.wait_for_at(2, 1_010), Some(Duration::from_secs(50)));
        // More slots than the whole budget still only wait for a fresh window.
        assert_eq!(rl.wait_for_at(9, 1_010), Some(Duration::from_secs(50)));
        assert_eq!(rl.wait_for_at(2, 1_060), None);
        assert_eq!(RateLimiter::per_minute(0).wait_for_at(100, 0), None);
    }

    #[test]
    fn zero_disables_limit() {
        let rl = RateLimiter::per_minute(0);
        for t in 0..100 {
            assert!(rl.try_acquire_at(t));
        }
    }
}
