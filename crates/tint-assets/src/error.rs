/// Error types for asset and color-marker operations.
///
/// The decoder variants cover every way a marker payload can be malformed:
/// bad magic, bad version, oversized quantities, overlong LEB128 encodings,
/// truncated or trailing bytes, and a flag field shorter than the quantity
/// count requires.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The payload does not start with a known marker tag.
    #[error("bad marker magic: {0:#06x}")]
    BadMagic(u16),

    /// The marker version is not 1 or 2.
    #[error("unsupported marker version: {0}")]
    BadVersion(u16),

    /// A quantity exceeds the 2^63-1 protocol bound.
    #[error("quantity out of range: {0}")]
    QuantityOutOfRange(u64),

    /// A LEB128 value used more than 10 bytes.
    #[error("LEB128 value too long")]
    Leb128TooLong,

    /// A LEB128 value's 10th byte carries bits beyond 64-bit range.
    #[error("LEB128 value overflows 64 bits")]
    Leb128Overflow,

    /// Bytes remained after a complete marker payload.
    #[error("trailing {0} bytes after marker payload")]
    TrailingBytes(usize),

    /// The metadata is too short to hold the exchange-flags bitfield.
    #[error("flag field too short: need {expected} bytes, metadata has {got}")]
    ShortFlagField {
        /// Bitfield bytes required by the quantity count.
        expected: usize,
        /// Metadata bytes actually present.
        got: usize,
    },

    /// Error from the primitives crate (typically unexpected end of data).
    #[error("primitives error: {0}")]
    Primitives(#[from] tint_primitives::PrimitivesError),

    /// Error from the script crate.
    #[error("script error: {0}")]
    Script(#[from] tint_script::ScriptError),
}
