use tint_assets::{AssetId, Money};
use tint_transaction::OutPoint;

use crate::context::ChangeType;

/// Error types for the transaction builder.
///
/// Planner errors abort the build; signer errors are raised to the caller;
/// policy violations are collected by `verify` as values instead.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// The group's coins cannot cover the pass target.
    #[error("not enough funds in group '{group}': missing {missing}")]
    NotEnoughFunds {
        /// Name of the funding group that failed.
        group: String,
        /// The uncovered amount (native or asset).
        missing: Money,
    },

    /// An input spends an outpoint no coin map or finder can resolve.
    #[error("coin not found for input {input_index} spending {outpoint}")]
    CoinNotFound {
        /// The unresolvable outpoint.
        outpoint: OutPoint,
        /// Index of the input referencing it.
        input_index: usize,
    },

    /// Change is material but no change script is configured for the kind.
    #[error("no {0:?} change script configured")]
    MissingChangeScript(ChangeType),

    /// The single overlay output is already reserved by another subsystem.
    #[error("the op-return output is already reserved by {0}")]
    OpReturnConflict(&'static str),

    /// A second asset id was queued for issuance in the same session.
    #[error("cannot issue asset {second}: asset {first} is already being issued")]
    MultipleIssuance {
        /// The asset id already queued for issuance.
        first: AssetId,
        /// The conflicting asset id.
        second: AssetId,
    },

    /// No issuance coin authorizes the asset being issued.
    #[error("no issuance coin for asset {0}")]
    MissingIssuanceCoin(AssetId),

    /// An exchange operation was queued after asset intents.
    #[error("exchange operations must be queued before any asset intent in the group")]
    ExchangeAfterAssetIntents,

    /// The marker op-code is already set to an incompatible value.
    #[error("marker op-code already set to {current:#04x}")]
    MarkerOpCodeConflict {
        /// The op-code currently recorded in the marker.
        current: u8,
    },

    /// A send amount was negative.
    #[error("send amount must not be negative: {0}")]
    NegativeAmount(i64),

    /// An input's locking script matches no signable template.
    #[error("cannot sign input {input_index}: unsupported script template")]
    UnsupportedScriptTemplate {
        /// Index of the unsignable input.
        input_index: usize,
    },

    /// `cover_the_rest` was called without `continue_to_build`.
    #[error("cover_the_rest requires continue_to_build first")]
    MissingBaseTransaction,

    /// `combine_signatures` was called with no transactions.
    #[error("no transactions to combine")]
    NothingToCombine,

    /// The change fixed point failed to stabilize.
    #[error("change computation did not converge in group '{group}'")]
    ChangeNotConverged {
        /// Name of the funding group that oscillated.
        group: String,
    },

    /// A script coin's redeem script does not hash to the output's script hash.
    #[error("invalid script coin: {0}")]
    InvalidScriptCoin(String),

    /// A stealth address or payment is malformed.
    #[error("invalid stealth address: {0}")]
    InvalidStealthAddress(String),

    /// Error from the assets crate (marker codec).
    #[error("asset error: {0}")]
    Asset(#[from] tint_assets::AssetError),

    /// Error from the transaction crate.
    #[error("transaction error: {0}")]
    Transaction(#[from] tint_transaction::TransactionError),

    /// Error from the script crate.
    #[error("script error: {0}")]
    Script(#[from] tint_script::ScriptError),

    /// Error from the primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] tint_primitives::PrimitivesError),
}
