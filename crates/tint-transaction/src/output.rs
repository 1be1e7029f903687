//! Transaction output with satoshi value and locking script.
//!
//! Defines the spending conditions for the output's value.

use tint_primitives::wire::{VarInt, WireReader, WireWriter};
use tint_script::Script;

use crate::TransactionError;

/// A single output in a transaction.
///
/// Each output specifies a satoshi `value` and a `locking_script`
/// (scriptPubKey) that defines the conditions under which the funds may be
/// spent.
///
/// # Wire format
///
/// | Field          | Size         |
/// |----------------|--------------|
/// | satoshis       | 8 bytes (LE) |
/// | script length  | VarInt       |
/// | locking_script | variable     |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutput {
    /// The number of satoshis locked by this output.
    pub satoshis: u64,

    /// The locking script (scriptPubKey) that defines spending conditions.
    pub locking_script: Script,
}

impl TransactionOutput {
    /// Create a new output.
    ///
    /// # Arguments
    /// * `satoshis` - The output value.
    /// * `locking_script` - The locking script.
    ///
    /// # Returns
    /// A new `TransactionOutput`.
    pub fn new(satoshis: u64, locking_script: Script) -> Self {
        TransactionOutput {
            satoshis,
            locking_script,
        }
    }

    /// Deserialize a `TransactionOutput` from a `WireReader`.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded output.
    ///
    /// # Returns
    /// `Ok(TransactionOutput)` on success, or an error if the data is
    /// truncated or malformed.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let satoshis = reader.read_u64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading satoshis: {}", e))
        })?;

        let script_bytes = reader.read_varstring().map_err(|e| {
            TransactionError::SerializationError(format!("reading locking script: {}", e))
        })?;

        Ok(TransactionOutput {
            satoshis,
            locking_script: Script::from_bytes(script_bytes),
        })
    }

    /// Serialize this `TransactionOutput` into a `WireWriter`.
    ///
    /// # Arguments
    /// * `writer` - The writer to append serialized bytes to.
    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_u64_le(self.satoshis);
        let script_bytes = self.locking_script.to_bytes();
        writer.write_varint(VarInt::from(script_bytes.len()));
        writer.write_bytes(script_bytes);
    }

    /// Return the serialized byte length of this output.
    ///
    /// # Returns
    /// 8 (value) + varint length + script bytes.
    pub fn serialized_len(&self) -> usize {
        let script_len = self.locking_script.len();
        8 + VarInt::from(script_len).length() + script_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify wire round-trip of an output.
    #[test]
    fn test_wire_roundtrip() {
        let output = TransactionOutput::new(
            1234,
            Script::from_hex("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac")
                .expect("valid hex"),
        );

        let mut writer = WireWriter::new();
        output.write_to(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), output.serialized_len());

        let mut reader = WireReader::new(&bytes);
        let restored = TransactionOutput::read_from(&mut reader).expect("valid encoding");
        assert_eq!(restored, output);
    }

    /// Verify serialized_len for an empty script output.
    #[test]
    fn test_serialized_len_empty_script() {
        let output = TransactionOutput::new(0, Script::new());
        assert_eq!(output.serialized_len(), 9);
    }
}
