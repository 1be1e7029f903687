//! Standard output-script templates.
//!
//! Provides classification of locking scripts into the standard templates
//! the transaction builder knows how to sign and estimate, plus the
//! corresponding constructors.

use tint_primitives::hash::hash160;

use crate::opcodes::*;
use crate::script::is_pubkey_encoding;
use crate::{Script, ScriptError};

/// The standard locking-script templates recognized by the signer and the
/// size estimator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptTemplate {
    /// `<pubkey> OP_CHECKSIG`
    PayToPubkey {
        /// The SEC1-encoded public key pushed by the script.
        pubkey: Vec<u8>,
    },
    /// `OP_DUP OP_HASH160 <hash160> OP_EQUALVERIFY OP_CHECKSIG`
    PayToPubkeyHash {
        /// The 20-byte public key hash.
        pubkey_hash: [u8; 20],
    },
    /// `OP_HASH160 <hash160> OP_EQUAL`
    PayToScriptHash {
        /// The 20-byte redeem script hash.
        script_hash: [u8; 20],
    },
    /// `OP_M <pubkey>... OP_N OP_CHECKMULTISIG`
    Multisig {
        /// Number of signatures required (M).
        required: usize,
        /// The SEC1-encoded public keys in script order.
        pubkeys: Vec<Vec<u8>>,
    },
    /// `OP_RETURN ...` data carrier.
    NullData,
    /// Anything else.
    Unknown,
}

impl ScriptTemplate {
    /// Classify a locking script into one of the standard templates.
    ///
    /// # Arguments
    /// * `script` - The locking script to classify.
    ///
    /// # Returns
    /// The matched `ScriptTemplate`, or `Unknown`.
    pub fn classify(script: &Script) -> ScriptTemplate {
        if script.is_p2pkh() {
            let mut pubkey_hash = [0u8; 20];
            pubkey_hash.copy_from_slice(&script.to_bytes()[3..23]);
            return ScriptTemplate::PayToPubkeyHash { pubkey_hash };
        }
        if script.is_p2sh() {
            let mut script_hash = [0u8; 20];
            script_hash.copy_from_slice(&script.to_bytes()[2..22]);
            return ScriptTemplate::PayToScriptHash { script_hash };
        }
        if script.is_null_data() {
            return ScriptTemplate::NullData;
        }

        let parts = match script.chunks() {
            Ok(p) => p,
            Err(_) => return ScriptTemplate::Unknown,
        };

        // P2PK: <pubkey> OP_CHECKSIG
        if parts.len() == 2 && parts[1].op == OP_CHECKSIG {
            if let Some(pubkey) = parts[0].data.as_ref() {
                if is_pubkey_encoding(pubkey) {
                    return ScriptTemplate::PayToPubkey {
                        pubkey: pubkey.clone(),
                    };
                }
            }
        }

        // Multisig: OP_M <pubkey>... OP_N OP_CHECKMULTISIG
        if parts.len() >= 4 && parts[parts.len() - 1].op == OP_CHECKMULTISIG {
            let required = match small_int_value(parts[0].op) {
                Some(m) => m,
                None => return ScriptTemplate::Unknown,
            };
            let total = match small_int_value(parts[parts.len() - 2].op) {
                Some(n) => n,
                None => return ScriptTemplate::Unknown,
            };
            let key_chunks = &parts[1..parts.len() - 2];
            if key_chunks.len() != total || required > total || required == 0 {
                return ScriptTemplate::Unknown;
            }
            let mut pubkeys = Vec::with_capacity(total);
            for chunk in key_chunks {
                match chunk.data.as_ref() {
                    Some(k) if is_pubkey_encoding(k) => pubkeys.push(k.clone()),
                    _ => return ScriptTemplate::Unknown,
                }
            }
            return ScriptTemplate::Multisig { required, pubkeys };
        }

        ScriptTemplate::Unknown
    }
}

/// Create a P2PK locking script: `<pubkey> OP_CHECKSIG`.
///
/// # Arguments
/// * `pubkey` - SEC1-encoded public key bytes.
///
/// # Returns
/// `Ok(Script)` containing the P2PK locking script.
pub fn pay_to_pubkey(pubkey: &[u8]) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    script.append_push_data(pubkey)?;
    script.append_opcodes(&[OP_CHECKSIG])?;
    Ok(script)
}

/// Create a P2PKH locking script from a 20-byte public key hash.
///
/// Produces: `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
///
/// # Arguments
/// * `pubkey_hash` - The 20-byte Hash160 of the public key.
///
/// # Returns
/// The 25-byte P2PKH locking script.
pub fn pay_to_pubkey_hash(pubkey_hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(25);
    bytes.push(OP_DUP);
    bytes.push(OP_HASH160);
    bytes.push(OP_DATA_20);
    bytes.extend_from_slice(pubkey_hash);
    bytes.push(OP_EQUALVERIFY);
    bytes.push(OP_CHECKSIG);
    Script::from_bytes(&bytes)
}

/// Create a P2SH locking script from a 20-byte script hash.
///
/// Produces: `OP_HASH160 <hash> OP_EQUAL`
///
/// # Arguments
/// * `script_hash` - The 20-byte Hash160 of the redeem script.
///
/// # Returns
/// The 23-byte P2SH locking script.
pub fn pay_to_script_hash(script_hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(23);
    bytes.push(OP_HASH160);
    bytes.push(OP_DATA_20);
    bytes.extend_from_slice(script_hash);
    bytes.push(OP_EQUAL);
    Script::from_bytes(&bytes)
}

/// Wrap an arbitrary redeem script in a P2SH locking script.
///
/// # Arguments
/// * `redeem` - The redeem script to hash.
///
/// # Returns
/// The P2SH locking script committing to `Hash160(redeem)`.
pub fn pay_to_script(redeem: &Script) -> Script {
    pay_to_script_hash(&hash160(redeem.to_bytes()))
}

/// Create a bare multisig locking script.
///
/// Produces: `OP_M <pubkey1> ... <pubkeyN> OP_N OP_CHECKMULTISIG`
///
/// # Arguments
/// * `required` - Number of signatures required (1..=16, at most `pubkeys.len()`).
/// * `pubkeys` - The SEC1-encoded public keys (1..=16 of them).
///
/// # Returns
/// `Ok(Script)` containing the multisig script, or an error if the
/// parameters are out of range.
pub fn multisig(required: usize, pubkeys: &[Vec<u8>]) -> Result<Script, ScriptError> {
    if pubkeys.is_empty() || pubkeys.len() > 16 {
        return Err(ScriptError::InvalidMultisig(format!(
            "pubkey count {} out of range",
            pubkeys.len()
        )));
    }
    if required == 0 || required > pubkeys.len() {
        return Err(ScriptError::InvalidMultisig(format!(
            "required {} out of range for {} keys",
            required,
            pubkeys.len()
        )));
    }

    let mut script = Script::new();
    script.append_opcodes(&[small_int_op(required).expect("validated range")])?;
    for pubkey in pubkeys {
        script.append_push_data(pubkey)?;
    }
    script.append_opcodes(&[
        small_int_op(pubkeys.len()).expect("validated range"),
        OP_CHECKMULTISIG,
    ])?;
    Ok(script)
}

/// Create a null-data (OP_RETURN) locking script carrying a payload.
///
/// Produces: `OP_RETURN PUSH(payload)`
///
/// # Arguments
/// * `payload` - The data bytes to carry.
///
/// # Returns
/// `Ok(Script)` containing the data-carrier script.
pub fn null_data(payload: &[u8]) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    script.append_opcodes(&[OP_RETURN])?;
    script.append_push_data(payload)?;
    Ok(script)
}
