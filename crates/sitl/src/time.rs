//! Simulated clock for SITL.
//!
//! Wraps a shared atomic counter so the filters, the simulated sensors and
//! the driving loop all read one consistent simulation time. Delays advance
//! the counter instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use tiltrange_core::traits::TimeSource;

/// Simulation clock backed by a shared atomic counter.
///
/// Clones share the same counter: advancing one advances all of them.
#[derive(Debug, Clone)]
pub struct SitlClock {
    time_us: Arc<AtomicU64>,
}

impl SitlClock {
    /// Create a new clock starting at zero.
    pub fn new() -> Self {
        Self {
            time_us: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance simulation time by the given number of microseconds.
    pub fn advance_us(&self, us: u64) {
        self.time_us.fetch_add(us, Ordering::Relaxed);
    }

    /// Set simulation time to an absolute value.
    pub fn set_us(&self, us: u64) {
        self.time_us.store(us, Ordering::Relaxed);
    }
}

impl Default for SitlClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SitlClock {
    fn now_us(&self) -> u64 {
        self.time_us.load(Ordering::Relaxed)
    }
}

/// Delays are non-blocking: they move simulation time forward.
impl DelayNs for SitlClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance_us(u64::from(ns).div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.advance_us(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_us(u64::from(ms) * 1000);
    }
}
