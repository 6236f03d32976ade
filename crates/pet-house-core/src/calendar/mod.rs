//! Date math for boarding stays and calendar views.
//!
//! - [`pricing`]: day counts, totals and date-range checks
//! - [`occupancy`]: day-bucketed record counts and the month grid

mod occupancy;
mod pricing;

pub use occupancy::*;
pub use pricing::*;
