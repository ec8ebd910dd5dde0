//! Time abstraction for the fusion pipeline.
//!
//! The complementary filter measures elapsed time between updates and the
//! calibration routines block between samples. Both are injected here so the
//! core can run against a hardware timer, a simulator clock, or a mock.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

/// Monotonic microsecond clock.
///
/// Implementations must never go backwards. `elapsed_since` saturates so a
/// reference taken "in the future" reads as zero elapsed time.
///
/// # Example
///
/// ```
/// use tiltrange_core::traits::{MockTime, TimeSource};
///
/// fn due<T: TimeSource>(time: &T, last_us: u64, period_us: u64) -> bool {
///     time.elapsed_since(last_us) >= period_us
/// }
///
/// let time = MockTime::new();
/// time.advance(10_000);
/// assert!(due(&time, 0, 10_000));
/// ```
pub trait TimeSource: Clone + Send + Sync {
    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Returns current time in microseconds since system start.
    fn now_us(&self) -> u64;

    /// Returns elapsed time in microseconds since a reference point.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

/// Borrowed clocks are clocks too, so a test can keep driving a `MockTime`
/// while a filter holds a reference to it.
impl<T: TimeSource> TimeSource for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock time source with manually controlled time.
///
/// ```
/// use tiltrange_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// time.advance(1000);
/// assert_eq!(time.now_us(), 1000);
/// assert_eq!(time.now_ms(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
}

// Safety: MockTime is only used in single-threaded test contexts where Cell
// is sound. The Send + Sync bounds exist for embedded timer implementations.
unsafe impl Send for MockTime {}
unsafe impl Sync for MockTime {}

impl MockTime {
    /// Creates a new `MockTime` starting at time 0.
    pub fn new() -> Self {
        Self {
            current_us: Cell::new(0),
        }
    }

    /// Creates a new `MockTime` starting at the specified time.
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the current time by the specified amount.
    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }
}

impl TimeSource for MockTime {
    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

/// Blocking delay that advances a [`MockTime`] instead of sleeping.
///
/// Lets calibration tests check how long a routine would have blocked.
pub struct MockDelay<'a> {
    time: &'a MockTime,
    total_ns: u64,
    calls: u32,
}

impl<'a> MockDelay<'a> {
    pub fn new(time: &'a MockTime) -> Self {
        Self {
            time,
            total_ns: 0,
            calls: 0,
        }
    }

    /// Total delay requested so far, in microseconds.
    pub fn total_us(&self) -> u64 {
        self.total_ns / 1000
    }

    /// Number of delay calls made.
    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
        self.time.advance(u64::from(ns) / 1000);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
