//! Telemetry Monitor - tracks how fresh the latest state update is
//!
//! **Purpose**: Tell callers whether sensor reads reflect a live robot or a
//! frame that stopped updating (bridge down, robot switched off, stream stalled).
//!
//! **App Start Relative Time Pattern**:
//! - Uses monotonic time anchored to application start
//! - Unaffected by system clock changes (NTP, manual adjustments)
//! - Safe to store in AtomicU64 for lock-free access

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global anchor point for monotonic time
static APP_START: OnceLock<Instant> = OnceLock::new();

/// Monotonic time as microseconds since app start
fn get_monotonic_micros() -> u64 {
    let start = APP_START.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Telemetry freshness monitor
///
/// Before the first state update the telemetry counts as stale.
#[derive(Debug)]
pub struct TelemetryMonitor {
    last_update: AtomicU64,
    seen: AtomicBool,
    stale_after: Duration,
}

impl TelemetryMonitor {
    /// Create a new monitor
    ///
    /// # Example
    /// ```
    /// # use thymio_driver::heartbeat::TelemetryMonitor;
    /// # use std::time::Duration;
    /// let monitor = TelemetryMonitor::new(Duration::from_secs(1));
    /// assert!(monitor.is_stale());
    /// monitor.register_update();
    /// assert!(!monitor.is_stale());
    /// ```
    pub fn new(stale_after: Duration) -> Self {
        Self {
            last_update: AtomicU64::new(get_monotonic_micros()),
            seen: AtomicBool::new(false),
            stale_after,
        }
    }

    /// Record that a state update was just stored
    pub fn register_update(&self) {
        self.last_update
            .store(get_monotonic_micros(), Ordering::Relaxed);
        self.seen.store(true, Ordering::Release);
    }

    /// Whether any state update has been received
    pub fn has_update(&self) -> bool {
        self.seen.load(Ordering::Acquire)
    }

    /// Time since the last state update, `None` before the first one
    pub fn time_since_last_update(&self) -> Option<Duration> {
        if !self.has_update() {
            return None;
        }
        let last_us = self.last_update.load(Ordering::Relaxed);
        let now_us = get_monotonic_micros();
        Some(Duration::from_micros(now_us.saturating_sub(last_us)))
    }

    /// Returns true if no state update arrived within the staleness window
    pub fn is_stale(&self) -> bool {
        match self.time_since_last_update() {
            Some(age) => age >= self.stale_after,
            None => true,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }
}
