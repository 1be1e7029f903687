//! Tint SDK - Colored-coin transaction builder.
//!
//! The builder is a single-use, single-threaded session: add coins and
//! keys, configure change scripts, declare intents (sends, asset sends,
//! issuance, fees, stealth payments), optionally open further funding
//! groups with [`TransactionBuilder::then`], and call
//! [`TransactionBuilder::build`]. The planner selects coins per group and
//! per asset, runs the change fixed point, arranges the color marker, and
//! optionally signs every input for which a key is known. Verification,
//! size estimation, and signature combination operate on finished
//! transactions.

pub mod builder;
pub mod coin;
pub mod context;
pub mod estimate;
pub mod fee;
pub mod policy;
pub mod select;
pub mod signer;
pub mod stealth;

mod error;
mod group;
mod intent;

pub use builder::{MetadataRepository, TransactionBuilder};
pub use coin::{BearerCoin, Coin, ColoredCoin, IssuanceCoin, PlainCoin, ScriptCoin, StealthCoin};
pub use context::ChangeType;
pub use error::BuilderError;
pub use fee::FeeRate;
pub use policy::{MinerPolicy, PolicyViolation, StandardPolicy, TransactionPolicy};
pub use select::{CoinSelector, DefaultCoinSelector};
pub use stealth::{StealthAddress, StealthPayment};

#[cfg(test)]
mod tests;
