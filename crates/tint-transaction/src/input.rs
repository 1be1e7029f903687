//! Transaction input referencing a previous output.
//!
//! Contains the outpoint being spent, the unlocking script, and the
//! sequence number. Previous-output data (value and locking script) is
//! supplied externally through the builder's coin model rather than being
//! stored on the input.

use tint_primitives::wire::{VarInt, WireReader, WireWriter};
use tint_script::Script;

use crate::outpoint::OutPoint;
use crate::TransactionError;

/// Default sequence number indicating a finalized input (no lock-time).
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A single input in a transaction.
///
/// Each input references an output from a previous transaction through its
/// `previous_outpoint`. The `unlocking_script` (scriptSig) supplies the data
/// required to satisfy the referenced output's locking script.
///
/// # Wire format
///
/// | Field             | Size             |
/// |-------------------|------------------|
/// | previous_outpoint | 36 bytes         |
/// | script length     | VarInt           |
/// | unlocking_script  | variable         |
/// | sequence          | 4 bytes (LE)     |
#[derive(Clone, Debug)]
pub struct TransactionInput {
    /// The outpoint of the output being spent.
    pub previous_outpoint: OutPoint,

    /// The unlocking script (scriptSig) that proves authorization.
    /// `None` when the input has not yet been signed.
    pub unlocking_script: Option<Script>,

    /// Sequence number. Defaults to `0xFFFFFFFF` (finalized).
    pub sequence: u32,
}

impl TransactionInput {
    /// Create a new unsigned input spending the given outpoint.
    ///
    /// # Arguments
    /// * `previous_outpoint` - The outpoint being spent.
    ///
    /// # Returns
    /// A `TransactionInput` with no unlocking script and a finalized sequence.
    pub fn new(previous_outpoint: OutPoint) -> Self {
        TransactionInput {
            previous_outpoint,
            unlocking_script: None,
            sequence: DEFAULT_SEQUENCE_NUMBER,
        }
    }

    /// Deserialize a `TransactionInput` from a `WireReader`.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded input.
    ///
    /// # Returns
    /// `Ok(TransactionInput)` on success, or an error if the data is
    /// truncated or malformed.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let previous_outpoint = OutPoint::read_from(reader)?;

        let script_bytes = reader.read_varstring().map_err(|e| {
            TransactionError::SerializationError(format!("reading unlocking script: {}", e))
        })?;

        let sequence = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence: {}", e))
        })?;

        let unlocking_script = if script_bytes.is_empty() {
            None
        } else {
            Some(Script::from_bytes(script_bytes))
        };

        Ok(TransactionInput {
            previous_outpoint,
            unlocking_script,
            sequence,
        })
    }

    /// Serialize this `TransactionInput` into a `WireWriter`.
    ///
    /// # Arguments
    /// * `writer` - The writer to append serialized bytes to.
    pub fn write_to(&self, writer: &mut WireWriter) {
        self.previous_outpoint.write_to(writer);

        match &self.unlocking_script {
            Some(script) => {
                let script_bytes = script.to_bytes();
                writer.write_varint(VarInt::from(script_bytes.len()));
                writer.write_bytes(script_bytes);
            }
            None => {
                writer.write_varint(VarInt(0));
            }
        }

        writer.write_u32_le(self.sequence);
    }
}
