//! libvirt version number decoding.

/// Decode libvirt's `major * 1_000_000 + minor * 1_000 + release` encoding.
pub fn format_version(encoded: u64) -> String {
    format!("{}.{}.{}", encoded / 1_000_000 % 1_000, encoded / 1_000 % 1_000, encoded % 1_000)
}
