//! Signature hash computation for transaction signing.
//!
//! Computes the hash that is signed by ECDSA to authorize spending a
//! transaction input, using the legacy (pre-segwit) digest algorithm of the
//! Bitcoin family: the transaction is re-serialized with per-input script
//! substitutions depending on the sighash flags, the flags are appended,
//! and the result is double-SHA-256 hashed.

use tint_primitives::hash::sha256d;
use tint_primitives::wire::{VarInt, WireWriter};

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

// -----------------------------------------------------------------------
// Legacy signature hash
// -----------------------------------------------------------------------

/// Compute the legacy signature hash for a given input.
///
/// The transaction is serialized with every input's unlocking script
/// cleared except the signed input, which carries the previous output's
/// locking script (`script_code`); outputs and sequences are masked
/// according to the flags; the 4-byte sighash type is appended; and the
/// whole preimage is double-SHA-256 hashed.
///
/// `SIGHASH_SINGLE` with an input index beyond the last output reproduces
/// the historical behavior of hashing the number one.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `script_code`  - The locking script of the output being spent.
/// * `sighash_type` - The combined sighash flags (e.g. `SIGHASH_ALL`).
///
/// # Returns
/// A 32-byte double-SHA256 hash to be signed by ECDSA.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let base_type = sighash_type & SIGHASH_MASK;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;

    // Historical edge case: SIGHASH_SINGLE with no matching output hashes
    // the number 1 instead of the serialized transaction.
    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        let mut one = [0u8; 32];
        one[0] = 1;
        return Ok(one);
    }

    let mut writer = WireWriter::with_capacity(256);
    writer.write_u32_le(tx.version);

    // Inputs.
    if anyone_can_pay {
        writer.write_varint(VarInt(1));
        let input = &tx.inputs[input_index];
        input.previous_outpoint.write_to(&mut writer);
        writer.write_varstring(script_code);
        writer.write_u32_le(input.sequence);
    } else {
        writer.write_varint(VarInt::from(tx.inputs.len()));
        for (i, input) in tx.inputs.iter().enumerate() {
            input.previous_outpoint.write_to(&mut writer);
            if i == input_index {
                writer.write_varstring(script_code);
            } else {
                writer.write_varint(VarInt(0));
            }
            let sequence = if i != input_index
                && (base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE)
            {
                0
            } else {
                input.sequence
            };
            writer.write_u32_le(sequence);
        }
    }

    // Outputs.
    match base_type {
        SIGHASH_NONE => {
            writer.write_varint(VarInt(0));
        }
        SIGHASH_SINGLE => {
            // Outputs up to and including the signed index; earlier outputs
            // are blanked to value -1 with an empty script.
            writer.write_varint(VarInt::from(input_index + 1));
            for (j, output) in tx.outputs.iter().take(input_index + 1).enumerate() {
                if j < input_index {
                    writer.write_u64_le(u64::MAX);
                    writer.write_varint(VarInt(0));
                } else {
                    output.write_to(&mut writer);
                }
            }
        }
        _ => {
            writer.write_varint(VarInt::from(tx.outputs.len()));
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);

    Ok(sha256d(&writer.into_bytes()))
}
