//! Error types for the `aht-rs` crate.

/// Errors for keys the record encoding cannot represent.
///
/// Both kinds are rejected at every public entry point that takes a key,
/// before any bucket is touched, so a failed operation never leaves the
/// table half-mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    /// A zero-length key would encode as a lone `0x00` prefix byte, which is
    /// indistinguishable from the bucket terminator.
    #[error("zero-length keys cannot be stored")]
    ZeroLength,

    /// The length prefix carries 15 bits, so keys longer than 32767 bytes
    /// cannot be encoded.
    #[error("key of {0} bytes exceeds the maximum length of 32767")]
    Oversize(usize),
}
