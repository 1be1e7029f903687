/// Tint SDK - Cryptographic primitives, hashing, and wire encoding.
///
/// This crate provides the foundational building blocks for the Tint SDK:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160, SHA-1)
/// - Elliptic curve cryptography (secp256k1 keys, ECDSA signatures, tweaks)
/// - Wire reader/writer and variable-length integer encoding

pub mod ec;
pub mod hash;
pub mod wire;

mod error;
pub use error::PrimitivesError;
