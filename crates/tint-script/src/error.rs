/// Error types for script operations.
///
/// Covers parsing errors, push encoding failures, and template
/// construction problems.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Generic invalid script error.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// Attempted to append a push-data opcode through the opcode path.
    #[error("use append_push_data for push data opcodes: {0:#04x}")]
    InvalidOpcodeType(u8),

    /// Invalid hex string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Not enough data in script to complete a push operation.
    #[error("not enough data")]
    DataTooSmall,

    /// Push data exceeds maximum allowed size.
    #[error("data too big")]
    DataTooBig,

    /// Multisig template parameters are out of range.
    #[error("invalid multisig template: {0}")]
    InvalidMultisig(String),

    /// Error from the primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] tint_primitives::PrimitivesError),
}
