//! Small pure helpers.

pub mod units;
pub mod version;
