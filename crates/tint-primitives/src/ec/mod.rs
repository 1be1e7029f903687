//! Elliptic curve cryptography on secp256k1.
//!
//! Provides private/public key types wrapping k256, deterministic ECDSA
//! signatures with DER serialization, ECDH shared points, and additive
//! scalar/point tweaks used by stealth payment derivation.

pub mod private_key;
pub mod public_key;
pub mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;
