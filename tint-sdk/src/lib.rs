#![deny(missing_docs)]

//! Tint SDK - Complete SDK.
//!
//! Re-exports all Tint SDK components for convenient single-crate usage.

pub use tint_assets as assets;
pub use tint_builder as builder;
pub use tint_primitives as primitives;
pub use tint_script as script;
pub use tint_transaction as transaction;
