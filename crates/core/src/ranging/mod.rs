//! Time-of-flight ranging filter
//!
//! Turns a noisy, occasionally invalid distance stream into a stable
//! estimate: validity and bounds rejection, a 5-slot median, then
//! exponential smoothing.

pub mod filter;
pub mod median;
pub mod types;

pub use filter::{RangingFilter, DEFAULT_BETA};
pub use median::{MedianWindow, MEDIAN_WINDOW};
pub use types::{
    DistanceSample, Freshness, RangeReading, StaleReason, MAX_VALID_MM, MIN_VALID_MM,
    RANGE_STATUS_OUT_OF_RANGE,
};
