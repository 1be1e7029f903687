/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction structure is invalid (e.g. input index out of range).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An underlying script error (forwarded from `tint-script`).
    #[error("script error: {0}")]
    Script(#[from] tint_script::ScriptError),
    /// An underlying primitives error (forwarded from `tint-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] tint_primitives::PrimitivesError),
}
