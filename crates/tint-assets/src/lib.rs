//! Tint SDK - Colored-coin asset overlay.
//!
//! Provides asset identity (20-byte ids derived from issuer scripts), asset
//! and native money types, the LEB128 varint used by the overlay, and the
//! color-marker codec that encodes per-output asset quantities, protocol
//! version, op-code, and metadata into a null-data output.

pub mod asset_id;
pub mod leb128;
pub mod marker;
pub mod money;

mod error;
pub use asset_id::AssetId;
pub use error::AssetError;
pub use marker::ColorMarker;
pub use money::{AssetAmount, Money, MoneyBag};
