//! Unsigned LEB128 encoding capped at 10 bytes.
//!
//! The color-marker payload carries asset quantities as little-endian
//! base-128 varints with a continuation bit. A 64-bit value needs at most
//! 10 bytes, and the 10th byte may only contribute bit 63; anything more is
//! rejected as an overflow.

use tint_primitives::wire::{WireReader, WireWriter};

use crate::AssetError;

/// Maximum encoded length of a 64-bit LEB128 value.
pub const MAX_LEB128_LEN: usize = 10;

/// Append a value in unsigned LEB128 encoding.
///
/// # Arguments
/// * `writer` - The writer to append to.
/// * `value` - The value to encode.
pub fn write_leb128(writer: &mut WireWriter, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_u8(byte);
        if value == 0 {
            return;
        }
    }
}

/// Read an unsigned LEB128 value.
///
/// Rejects encodings longer than 10 bytes and 10th bytes carrying bits that
/// would overflow 64-bit range.
///
/// # Arguments
/// * `reader` - The reader positioned at the first LEB128 byte.
///
/// # Returns
/// `Ok(value)` on success, or an `AssetError` on truncation, overlong
/// encoding, or overflow.
pub fn read_leb128(reader: &mut WireReader) -> Result<u64, AssetError> {
    let mut result: u64 = 0;
    for i in 0..MAX_LEB128_LEN {
        let byte = reader.read_u8()?;
        if i == MAX_LEB128_LEN - 1 && byte & 0x7e != 0 {
            return Err(AssetError::Leb128Overflow);
        }
        result |= ((byte & 0x7f) as u64) << (7 * i as u32);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(AssetError::Leb128TooLong)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: u64) -> u64 {
        let mut writer = WireWriter::new();
        write_leb128(&mut writer, value);
        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        let decoded = read_leb128(&mut reader).expect("should decode");
        assert_eq!(reader.remaining(), 0);
        decoded
    }

    /// Verify round-trips across the size classes.
    #[test]
    fn test_roundtrip_values() {
        for value in [
            0u64,
            1,
            127,
            128,
            300,
            16_383,
            16_384,
            u32::MAX as u64,
            (1u64 << 63) - 1,
            u64::MAX,
        ] {
            assert_eq!(roundtrip(value), value);
        }
    }

    /// Verify known single and multi-byte encodings.
    #[test]
    fn test_known_encodings() {
        let cases: Vec<(u64, Vec<u8>)> = vec![
            (0, vec![0x00]),
            (40, vec![0x28]),
            (127, vec![0x7f]),
            (128, vec![0x80, 0x01]),
            (300, vec![0xac, 0x02]),
        ];
        for (value, expected) in cases {
            let mut writer = WireWriter::new();
            write_leb128(&mut writer, value);
            assert_eq!(writer.into_bytes(), expected, "encoding of {}", value);
        }
    }

    /// Verify u64::MAX uses exactly 10 bytes with a 0x01 final byte.
    #[test]
    fn test_max_value_encoding() {
        let mut writer = WireWriter::new();
        write_leb128(&mut writer, u64::MAX);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[9], 0x01);
    }

    /// Verify an 11-byte encoding is rejected as too long.
    #[test]
    fn test_overlong_rejected() {
        let bytes = [0x80u8; 11];
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            read_leb128(&mut reader),
            Err(AssetError::Leb128TooLong)
        ));
    }

    /// Verify a 10th byte with overflow bits is rejected.
    #[test]
    fn test_overflow_rejected() {
        // Nine continuation bytes then a 10th byte carrying bit 1.
        let mut bytes = vec![0x80u8; 9];
        bytes.push(0x02);
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            read_leb128(&mut reader),
            Err(AssetError::Leb128Overflow)
        ));
    }

    /// Verify truncated input surfaces as an error.
    #[test]
    fn test_truncated_rejected() {
        let bytes = [0x80u8; 3];
        let mut reader = WireReader::new(&bytes);
        assert!(read_leb128(&mut reader).is_err());
    }
}
