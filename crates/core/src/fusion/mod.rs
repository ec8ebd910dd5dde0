//! Attitude fusion
//!
//! Combines the rate and absolute-angle outputs of the orientation source
//! into a single drift-resistant roll/pitch estimate.

pub mod complementary;

pub use complementary::{
    ComplementaryFilter, FilterState, FusedAttitude, UpdateOutcome, ANGLE_LIMIT_DEG, DEFAULT_ALPHA,
    MAX_DT_US, MIN_DT_US, SPIKE_THRESHOLD_DEG,
};
