//! Unit conversions between libvirt's reporting units and Prometheus base
//! units.

use crate::constants::{BYTES_PER_KIB, NANOS_PER_SECOND};

/// Convert a nanosecond counter to seconds.
pub fn nanos_to_seconds(nanos: u64) -> f64 {
    nanos as f64 / NANOS_PER_SECOND
}

/// A raw host count or byte quantity as a sample value.
#[allow(clippy::cast_precision_loss)]
pub fn sample(value: u64) -> f64 {
    value as f64
}

/// Convert a kibibyte quantity to bytes, saturating on overflow.
pub fn kib_to_bytes(kib: u64) -> u64 {
    kib.saturating_mul(BYTES_PER_KIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanos_convert_exactly() {
        assert_eq!(nanos_to_seconds(2_000_000_000), 2.0);
        assert_eq!(nanos_to_seconds(0), 0.0);
        assert_eq!(nanos_to_seconds(1_500_000_000), 1.5);
    }

    #[test]
    fn kib_convert_exactly() {
        assert_eq!(kib_to_bytes(1024), 1_048_576);
        assert_eq!(kib_to_bytes(0), 0);
    }

    #[test]
    fn samples_are_exact_below_two_pow_53() {
        assert_eq!(sample(1_048_576), 1_048_576.0);
        assert_eq!(sample(9_007_199_254_740_992), 9_007_199_254_740_992.0);
    }

    #[test]
    fn kib_conversion_saturates() {
        assert_eq!(kib_to_bytes(u64::MAX), u64::MAX);
    }
}
