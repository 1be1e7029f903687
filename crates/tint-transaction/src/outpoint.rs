//! Transaction outpoint - the reference to a previous output being spent.

use std::fmt;

use tint_primitives::wire::{WireReader, WireWriter};

use crate::TransactionError;

/// The pair identifying a prior output being spent.
///
/// The txid is stored in internal (little-endian) byte order; the
/// conventional display string is byte-reversed hex.
///
/// # Wire format
///
/// | Field | Size          |
/// |-------|---------------|
/// | txid  | 32 bytes (LE) |
/// | vout  | 4 bytes (LE)  |
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// The 32-byte transaction id, internal byte order.
    pub txid: [u8; 32],
    /// Index of the output within the source transaction.
    pub vout: u32,
}

impl OutPoint {
    /// Create a new outpoint.
    ///
    /// # Arguments
    /// * `txid` - The 32-byte transaction id in internal byte order.
    /// * `vout` - The output index.
    ///
    /// # Returns
    /// A new `OutPoint`.
    pub fn new(txid: [u8; 32], vout: u32) -> Self {
        OutPoint { txid, vout }
    }

    /// Create an outpoint from a display-order (big-endian) txid hex string.
    ///
    /// # Arguments
    /// * `txid_hex` - A 64-character hex string in conventional display order.
    /// * `vout` - The output index.
    ///
    /// # Returns
    /// `Ok(OutPoint)` on success, or an error if the hex is invalid.
    pub fn from_hex(txid_hex: &str, vout: u32) -> Result<Self, TransactionError> {
        let bytes = hex::decode(txid_hex)
            .map_err(|e| TransactionError::SerializationError(format!("invalid txid hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(TransactionError::SerializationError(format!(
                "txid must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut txid = [0u8; 32];
        txid.copy_from_slice(&bytes);
        txid.reverse();
        Ok(OutPoint { txid, vout })
    }

    /// Deserialize an `OutPoint` from a `WireReader`.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded outpoint.
    ///
    /// # Returns
    /// `Ok(OutPoint)` on success, or an error if the data is truncated.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let txid_bytes = reader.read_bytes(32).map_err(|e| {
            TransactionError::SerializationError(format!("reading outpoint txid: {}", e))
        })?;
        let mut txid = [0u8; 32];
        txid.copy_from_slice(txid_bytes);

        let vout = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading outpoint index: {}", e))
        })?;

        Ok(OutPoint { txid, vout })
    }

    /// Serialize this `OutPoint` into a `WireWriter`.
    ///
    /// # Arguments
    /// * `writer` - The writer to append serialized bytes to.
    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_bytes(&self.txid);
        writer.write_u32_le(self.vout);
    }
}

impl fmt::Display for OutPoint {
    /// Display as `<display-order txid hex>:<vout>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut id = self.txid;
        id.reverse();
        write!(f, "{}:{}", hex::encode(id), self.vout)
    }
}

impl fmt::Debug for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutPoint({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify display order is the byte-reversed txid.
    #[test]
    fn test_display_order() {
        let mut txid = [0u8; 32];
        txid[0] = 0xAB;
        let outpoint = OutPoint::new(txid, 3);
        let display = format!("{}", outpoint);
        assert!(display.starts_with("00000000"));
        assert!(display.ends_with("ab:3"));
    }

    /// Verify from_hex reverses into internal order and round-trips.
    #[test]
    fn test_from_hex_roundtrip() {
        let txid_hex = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
        let outpoint = OutPoint::from_hex(txid_hex, 0).expect("valid txid");
        assert_eq!(format!("{}", outpoint), format!("{}:0", txid_hex));
    }

    /// Verify wire round-trip.
    #[test]
    fn test_wire_roundtrip() {
        let outpoint = OutPoint::new([7u8; 32], 42);
        let mut writer = WireWriter::new();
        outpoint.write_to(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 36);

        let mut reader = WireReader::new(&bytes);
        let restored = OutPoint::read_from(&mut reader).expect("valid encoding");
        assert_eq!(outpoint, restored);
    }

    /// Verify a short txid hex is rejected.
    #[test]
    fn test_from_hex_bad_length() {
        assert!(OutPoint::from_hex("abcd", 0).is_err());
    }
}
